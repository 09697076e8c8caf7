//! Chat-completion backend used by the selection stage

mod openrouter;
#[cfg(test)]
pub(crate) mod testing;

pub use openrouter::OpenRouterClient;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::Result;

/// Name of the structured-output schema sent upstream
pub const SELECTION_SCHEMA_NAME: &str = "file_selection";

/// System message for every selection call
pub const SYSTEM_PROMPT: &str = "You are a strict JSON generator.";

/// One chat-completion round trip.
///
/// Implementations return `choices[0].message.content` untouched: usually a
/// JSON document encoded as a string, sometimes an already-decoded object.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<Value>;

    /// Model identifier placed in requests
    fn model(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
    pub json_schema: Value,
}

/// Request body for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: ResponseFormat,
    pub structured_outputs: bool,
}

impl ChatRequest {
    /// Deterministic request constrained to the selection schema
    pub fn selection(model: &str, max_tokens: u32, user_prompt: String) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt)],
            temperature: 0.0,
            max_tokens,
            response_format: ResponseFormat {
                kind: "json_schema".to_string(),
                json_schema: json!({
                    "name": SELECTION_SCHEMA_NAME,
                    "strict": true,
                    "schema": selection_schema(),
                }),
            },
            structured_outputs: true,
        }
    }

    /// Content of the user message
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

/// `{selected: string[], confidence?: number, ask?: string[]}`, nothing else
pub fn selection_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "selected": { "type": "array", "items": { "type": "string" } },
            "ask": { "type": "array", "items": { "type": "string" } },
            "confidence": { "type": "number" }
        },
        "required": ["selected"],
        "additionalProperties": false
    })
}
