use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::Message;

/// Result of a single chat call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub message: Message,

    /// The backend's response exactly as received, for provider-specific fields
    /// (usage, finish reason, ids) that are not modeled here.
    pub raw: Value,
}

impl ChatResponse {
    pub fn new(message: Message, raw: Value) -> Self {
        Self { message, raw }
    }

    pub fn text(&self) -> Option<&str> {
        self.message.first_text()
    }
}

/// Static description of the model behind a [`ChatModel`](super::ChatModel).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
    pub model_name: String,
    pub is_chat_model: bool,
    /// Whether the model accepts image content blocks.
    pub is_multimodal: bool,
}

impl ModelMetadata {
    pub fn chat(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            is_chat_model: true,
            is_multimodal: false,
        }
    }

    #[must_use]
    pub fn multimodal(mut self, is_multimodal: bool) -> Self {
        self.is_multimodal = is_multimodal;
        self
    }
}
