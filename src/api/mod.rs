//! HTTP surface for the triage engine and the intake extractor.
//!
//! Routes are nested under `/api/`. The router is composable:
//! `triage_router()` returns a `Router` that can be mounted on any axum
//! server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::triage_router;
pub use server::{serve, start_server_on, ServerSession, TriageServer};
pub use types::ApiContext;
