use std::error::Error as StdError;

use thiserror::Error;

/// Errors returned by [`ChatModel::chat`](super::ChatModel::chat).
#[derive(Error, Debug)]
pub enum ChatError {
    /// A content block cannot be expressed in the backend's request format.
    /// Raised before anything is sent.
    #[error("Unsupported content in message {message_index}, block {block_index}: {reason}")]
    UnsupportedContent {
        message_index: usize,
        block_index: usize,
        reason: String,
    },

    #[error("Message {message_index} has no content blocks")]
    EmptyMessage { message_index: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backend call itself failed. The inner error is passed through unchanged.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Failure of the remote completion call, or of interpreting its result.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("API error: status={status}, message={message}")]
    Api { status: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Response parsing error: {0}")]
    Parsing(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Completion response contained no choices")]
    NoChoices,

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Rejected while building a content block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Not an image data URI (expected a 'data:image' prefix): {0}")]
    InvalidDataUri(String),

    #[error("Unrecognized image source '{0}': expected a 'data:image' URI or an absolute URL")]
    InvalidImageSource(String),
}
