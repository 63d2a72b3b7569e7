pub mod escalation;

pub use escalation::{apply_overrides, OverrideOutcome};
