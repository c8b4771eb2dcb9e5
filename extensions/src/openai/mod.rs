//! Adapter for OpenAI-compatible `/chat/completions` endpoints.

mod adapter;
mod backend;
mod client;
mod error;
mod wire;

pub use adapter::HostedChatModel;
pub use backend::CompletionBackend;
pub use client::{OpenAiClient, OpenAiConfig};
pub use error::{OpenAiError, OpenAiErrorDetail, OpenAiErrorResponse};
pub use wire::{encode_png_data_uri, CompletionRequest, ImageUrl, WireMessage, WirePart};
