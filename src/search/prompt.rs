//! Question-answering prompt

use serde_json::{json, Value};

/// Bridge event that asks the host for a generated answer
pub const GENERATE_RESPONSE_EVENT: &str = "generate_response";

const INSTRUCTIONS: &str = "You are an AI research assistant. Your task is to answer questions \
based *only* on the provided text from a PDF document. Do not use any external knowledge. \
If the answer cannot be found in the text, state that the information is not present in the document.";

/// Prompt grounding `query` in `context`
pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "{}\n\n--- DOCUMENT TEXT ---\n\n{}\n\n--- END DOCUMENT TEXT ---\n\nQuestion: {}",
        INSTRUCTIONS, context, query
    )
}

/// Payload of a `generate_response` request
pub fn generate_response_payload(prompt: &str) -> Value {
    json!({ "topic": prompt })
}
