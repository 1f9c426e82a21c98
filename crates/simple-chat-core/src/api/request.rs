//! Request body construction for the chat completions endpoint.

use crate::conversation::Message;
use serde_json::json;

/// Model parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub model: String,
    pub temperature: f64,
}

/// Build a streaming chat completion request for the whole message log.
pub fn build_request_body(options: &RequestOptions, messages: &[Message]) -> serde_json::Value {
    json!({
        "model": options.model,
        "messages": messages,
        "temperature": options.temperature,
        "stream": true,
    })
}
