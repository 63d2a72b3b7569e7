/// Longest document prefix sent to the model, in characters.
pub const MAX_DOCUMENT_CHARS: usize = 2000;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a helpful medical assistant.";

/// First `MAX_DOCUMENT_CHARS` characters of the document.
pub fn truncate_document(text: &str) -> &str {
    match text.char_indices().nth(MAX_DOCUMENT_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Build the field-extraction prompt for one document.
pub fn build_extraction_prompt(document_text: &str) -> String {
    let document = truncate_document(document_text);
    format!(
        r#"You are a medical data extraction assistant. Extract the following patient details from the medical report below.
Return the result ONLY as a VALID JSON object. Do not add any markdown formatting.

Fields to extract:
- name (string, or "Unknown" if not found)
- age (integer, default 30 if not found)
- gender (string: "Male", "Female", or "Other")
- symptoms (string, summary of complaints)
- bp (string, format "120/80")
- heartRate (integer)
- temperature (float, degrees Fahrenheit)
- history (string, medical history if any)

If a value is missing, use a reasonable default or empty string.

Medical Report:
{document}
"#
    )
}
