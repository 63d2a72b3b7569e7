pub mod assembler;
pub mod classifier;
pub mod explain;
pub mod model;
pub mod normalize;
pub mod routing;
pub mod safety;
pub mod types;

pub use assembler::{TriageEngine, TriageError};
pub use model::{ModelError, ModelGeneration, ModelHandle, ModelSlot};
pub use types::{PatientIntake, TriageResult};
