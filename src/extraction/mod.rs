//! Intake extraction: free-text medical document → intake record, via a
//! local LLM. Sits upstream of the triage engine; its output is not trusted
//! beyond being a JSON object.

pub mod extractor;
pub mod ollama;
pub mod parser;
pub mod prompt;
pub mod types;

pub use extractor::*;
pub use ollama::*;
pub use parser::*;
pub use prompt::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Document contains no text")]
    EmptyDocument,

    #[error("LLM server is not running at {0}")]
    LlmConnection(String),

    #[error("LLM server returned error (status {status}): {body}")]
    LlmError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("Extraction failed upstream: {0}")]
    Upstream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
