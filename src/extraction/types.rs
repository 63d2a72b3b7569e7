use super::ExtractionError;

/// LLM client abstraction (allows mocking)
pub trait LlmClient: Send + Sync {
    fn generate(&self, model: &str, prompt: &str, system: &str)
        -> Result<String, ExtractionError>;

    fn is_model_available(&self, model: &str) -> Result<bool, ExtractionError>;
}
