mod error;
mod message;
mod options;
mod response;

use async_trait::async_trait;

pub use error::{BackendError, ChatError, ContentError};
pub use message::{ContentBlock, DataUri, ImageSource, Message, MessageRole, DATA_URI_IMAGE_PREFIX};
pub use options::ChatOptions;
pub use response::{ChatResponse, ModelMetadata};

/// A model that answers a conversation of role-tagged, multimodal messages.
///
/// Implementations hold no per-call state, so a single instance can serve concurrent
/// calls to the extent its backend allows it.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends the conversation and returns the model's reply.
    ///
    /// # Arguments
    /// * `messages` - The conversation so far, oldest first.
    /// * `options` - Backend-specific overrides for this call only.
    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse, ChatError>;

    /// Describes the configured model. Never contacts the backend.
    fn metadata(&self) -> ModelMetadata;

    /// Like [`chat`](Self::chat) with default options, returning only the reply text.
    async fn generate(&self, messages: &[Message]) -> Result<String, ChatError> {
        let response = self.chat(messages, &ChatOptions::default()).await?;
        Ok(response.text().unwrap_or_default().to_string())
    }
}
