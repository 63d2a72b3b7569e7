use super::parser::parse_extraction_response;
use super::prompt::{build_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use super::types::LlmClient;
use super::ExtractionError;
use crate::pipeline::types::PatientIntake;

/// Extract an intake record from document text with one LLM call. No retries.
pub fn extract_intake(
    client: &dyn LlmClient,
    model: &str,
    document_text: &str,
) -> Result<PatientIntake, ExtractionError> {
    if document_text.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }

    let prompt = build_extraction_prompt(document_text);
    tracing::debug!(model, chars = document_text.chars().count(), "Requesting intake extraction");

    let response = client.generate(model, &prompt, EXTRACTION_SYSTEM_PROMPT)?;
    let intake = parse_extraction_response(&response)?;

    tracing::info!(model, "Intake extracted from document");
    Ok(intake)
}

/// An LLM client bound to a model name, shareable across requests.
pub struct IntakeExtractor {
    client: Box<dyn LlmClient>,
    model: String,
}

impl IntakeExtractor {
    pub fn new(client: Box<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn extract(&self, document_text: &str) -> Result<PatientIntake, ExtractionError> {
        extract_intake(self.client.as_ref(), &self.model, document_text)
    }

    /// Whether the LLM server is reachable and has the configured model.
    pub fn is_ready(&self) -> Result<bool, ExtractionError> {
        self.client.is_model_available(&self.model)
    }
}
