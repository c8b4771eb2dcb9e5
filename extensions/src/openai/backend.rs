use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mmbridge_core::chat::BackendError;
use serde_json::Value;

use super::wire::CompletionRequest;

/// Something that can execute one chat-completion call.
///
/// Implementations are expected to be fully configured (endpoint, credentials)
/// before they are handed to an adapter.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Executes the request and returns the backend's response body unmodified.
    ///
    /// `timeout`, when given, bounds this call only.
    async fn create_completion(
        &self,
        request: &CompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<Value, BackendError>;
}

#[async_trait]
impl<T: CompletionBackend + ?Sized> CompletionBackend for Arc<T> {
    async fn create_completion(
        &self,
        request: &CompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<Value, BackendError> {
        (**self).create_completion(request, timeout).await
    }
}
