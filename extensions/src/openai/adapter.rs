use async_trait::async_trait;
use mmbridge_core::chat::{
    BackendError, ChatError, ChatModel, ChatOptions, ChatResponse, Message, ModelMetadata,
};
use serde::Deserialize;
use tracing::{debug, error, instrument, trace};

use super::backend::CompletionBackend;
use super::wire::{CompletionRequest, CompletionResponse, WireMessage};

/// Request keys options may not override. The adapter fills in `model` and `messages`,
/// and it reads back exactly one non-streamed response.
const RESERVED_KEYS: [&str; 3] = ["model", "messages", "stream"];

/// Serves the generic [`ChatModel`] interface through an OpenAI-style
/// chat-completions backend.
///
/// Holds the backend and model name, both fixed at construction. Each call to
/// [`chat`](ChatModel::chat) translates the messages, makes exactly one backend call and
/// returns the first choice's text.
#[derive(Debug, Clone)]
pub struct HostedChatModel<B> {
    backend: B,
    model: String,
}

impl<B: CompletionBackend> HostedChatModel<B> {
    /// Wraps an already configured backend. Nothing is validated or contacted here.
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Translates messages and options into the request body that [`chat`](ChatModel::chat)
    /// would send, without sending it.
    pub fn build_request(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<CompletionRequest, ChatError> {
        if let Some(key) = RESERVED_KEYS.iter().find(|key| options.extra.contains_key(**key)) {
            return Err(ChatError::InvalidRequest(format!(
                "option '{}' is set by the adapter and cannot be overridden",
                key
            )));
        }

        let mut wire_messages = Vec::with_capacity(messages.len());
        for (message_index, message) in messages.iter().enumerate() {
            if message.content.is_empty() {
                return Err(ChatError::EmptyMessage { message_index });
            }
            let wire = WireMessage::try_from_message(message).map_err(|unsupported| {
                ChatError::UnsupportedContent {
                    message_index,
                    block_index: unsupported.block_index,
                    reason: unsupported.reason,
                }
            })?;
            wire_messages.push(wire);
        }

        Ok(CompletionRequest {
            model: self.model.clone(),
            messages: wire_messages,
            options: options.to_params(),
        })
    }
}

#[async_trait]
impl<B: CompletionBackend> ChatModel for HostedChatModel<B> {
    #[instrument(skip(self, messages, options), fields(model = %self.model, messages = messages.len()))]
    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse, ChatError> {
        let request = self.build_request(messages, options).map_err(|e| {
            debug!(error = %e, "Rejected messages before dispatch");
            e
        })?;
        debug!(params = request.options.len(), timeout = ?options.timeout, "Dispatching completion request");

        let raw = self
            .backend
            .create_completion(&request, options.timeout)
            .await
            .map_err(|e| {
                error!(error = %e, "Completion backend call failed");
                e
            })?;
        trace!(response = %raw, "Completion backend returned");

        let text = CompletionResponse::deserialize(&raw)
            .map_err(|e| BackendError::Parsing(Box::new(e)))?
            .into_first_text()?;
        debug!(chars = text.len(), "Extracted reply from first choice");

        Ok(ChatResponse::new(Message::assistant(text), raw))
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata::chat(self.model.clone()).multimodal(true)
    }
}
