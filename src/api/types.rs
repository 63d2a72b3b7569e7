//! Shared state for the triage API.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::extraction::IntakeExtractor;
use crate::pipeline::TriageEngine;

/// Shared context for all API routes. Cheap to clone.
#[derive(Clone)]
pub struct ApiContext {
    pub engine: Arc<TriageEngine>,
    /// `None` when no LLM endpoint is configured.
    pub extractor: Option<Arc<IntakeExtractor>>,
    pub started_at: DateTime<Utc>,
}

impl ApiContext {
    pub fn new(engine: TriageEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            extractor: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_extractor(mut self, extractor: IntakeExtractor) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }
}

/// Request id assigned by the access middleware, available to handlers
/// through request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);
