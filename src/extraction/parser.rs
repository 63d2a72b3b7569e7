use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::ExtractionError;
use crate::pipeline::types::PatientIntake;

/// Markdown code fence, optionally tagged `json`.
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").unwrap());

/// Parse the model's reply into an intake record.
///
/// Models ignore "no markdown" instructions often enough that fenced replies
/// are accepted. The first JSON object in the reply wins; anything after it
/// is ignored. A reply of the form `{"error": "..."}` is surfaced as
/// `ExtractionError::Upstream`.
pub fn parse_extraction_response(response: &str) -> Result<PatientIntake, ExtractionError> {
    let body = strip_code_fence(response);
    let value = first_json_object(body)?;

    if let Some(error) = value.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(ExtractionError::Upstream(message));
    }

    serde_json::from_value(value).map_err(|e| ExtractionError::MalformedResponse(e.to_string()))
}

/// Inner text of the first code fence, or the whole reply if unfenced.
pub fn strip_code_fence(response: &str) -> &str {
    CODE_FENCE
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response)
        .trim()
}

fn first_json_object(text: &str) -> Result<Value, ExtractionError> {
    let start = text
        .find('{')
        .ok_or_else(|| ExtractionError::MalformedResponse("No JSON object in response".into()))?;

    let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value @ Value::Object(_))) => Ok(value),
        Some(Ok(_)) => Err(ExtractionError::MalformedResponse("Expected a JSON object".into())),
        Some(Err(e)) => Err(ExtractionError::MalformedResponse(e.to_string())),
        None => Err(ExtractionError::MalformedResponse("Empty response".into())),
    }
}
