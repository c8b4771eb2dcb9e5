use std::time::Duration;

use async_trait::async_trait;
use mmbridge_core::chat::BackendError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString}; // Keeps the key out of Debug output
use serde_json::Value;
use tracing::{debug, error, instrument, trace};
use url::Url;

use super::backend::CompletionBackend;
use super::error::{map_response_error, OpenAiError};
use super::wire::CompletionRequest;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for an OpenAI-compatible completions endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// May be empty for local servers that do not check credentials.
    pub(crate) api_key: SecretString,
    /// Base URL up to and including the API version, e.g. `http://localhost:8000/v1`.
    pub(crate) base_url: Url,
    /// Timeout for HTTP requests. Defaults to 60 seconds.
    pub(crate) timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a configuration pointing at the public OpenAI API.
    ///
    /// # Errors
    /// Returns `OpenAiError::InvalidConfiguration` if the default base URL fails to parse
    /// (which shouldn't happen).
    pub fn new(api_key: impl Into<String>) -> Result<Self, OpenAiError> {
        let base_url = Url::parse(DEFAULT_OPENAI_BASE_URL).map_err(|e| {
            OpenAiError::InvalidConfiguration(format!(
                "Internal error: Failed to parse default base URL: {}",
                e
            ))
        })?;

        Ok(Self {
            api_key: SecretString::from(api_key.into()),
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Points the configuration at a different server.
    ///
    /// A trailing slash is optional. `mailto:`-style URLs are rejected since no path
    /// can be appended to them.
    pub fn base_url(mut self, url: &str) -> Result<Self, OpenAiError> {
        let parsed = Url::parse(url).map_err(|e| {
            OpenAiError::InvalidConfiguration(format!("Invalid base URL '{}': {}", url, e))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(OpenAiError::InvalidConfiguration(format!(
                "Base URL '{}' cannot be used as a base",
                url
            )));
        }
        self.base_url = parsed;
        Ok(self)
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url_str(&self) -> &str {
        self.base_url.as_str()
    }

    // An empty key means "send no Authorization header", not an error
    fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }
}

/// HTTP implementation of [`CompletionBackend`] for OpenAI-compatible servers.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    http_client: Client,
}

impl OpenAiClient {
    /// Builds a default reqwest client if one is not provided.
    #[instrument(name = "openai_client_new", skip(config, client_override))]
    pub fn new(config: OpenAiConfig, client_override: Option<Client>) -> Result<Self, OpenAiError> {
        let http_client = match client_override {
            Some(client) => {
                debug!("Using provided HTTP client.");
                client
            }
            None => {
                debug!(timeout = ?config.timeout, "Building default HTTP client.");
                Client::builder()
                    .timeout(config.timeout)
                    .build()
                    .map_err(|e| {
                        OpenAiError::InvalidConfiguration(format!(
                            "Failed to build default HTTP client: {}",
                            e
                        ))
                    })?
            }
        };

        // Never log the key itself
        debug!(base_url = %config.base_url, has_api_key = config.has_api_key(), "OpenAI client initialized.");

        Ok(Self { config, http_client })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// `{base_url}/chat/completions`. Any path already on the base URL is kept.
    pub(crate) fn completions_url(&self) -> Result<Url, OpenAiError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                OpenAiError::InvalidConfiguration(
                    "Base URL cannot be a 'cannot-be-a-base' URL.".to_string(),
                )
            })?
            .pop_if_empty() // Drop the empty segment a trailing slash leaves
            .extend(["chat", "completions"]);

        trace!(built_url = %url, "Built completions URL");
        Ok(url)
    }

    async fn send_completion(
        &self,
        request: &CompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<Value, OpenAiError> {
        let url = self.completions_url()?;

        let request_json = serde_json::to_string(request).map_err(|e| {
            error!(error = %e, "Failed to serialize completion request body");
            OpenAiError::RequestSerialization(e)
        })?;
        trace!(bytes = request_json.len(), "Constructed completion request body");

        let mut builder = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(request_json);
        if self.config.has_api_key() {
            builder = builder.bearer_auth(self.config.api_key.expose_secret());
        }
        // Per-call timeout overrides the client-wide one for this request only
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(OpenAiError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            error!(%status, "Completion API returned error status");
            return Err(map_response_error(response).await);
        }

        let status = response.status();
        debug!(%status, "Received successful response for completion request");
        // Read as text first so the body can be logged if it fails to parse
        let raw_body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read successful response body");
            OpenAiError::Network(e)
        })?;
        trace!(body = %raw_body, "Received completion response body");

        serde_json::from_str(&raw_body).map_err(|e| {
            error!(parse_error = %e, raw_body = %raw_body, "Failed to parse completion response JSON");
            OpenAiError::ResponseParsing {
                context: "Parsing completion response".to_string(),
                source: e,
            }
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    #[instrument(skip(self, request), fields(base_url = self.config.base_url.as_str(), model = %request.model))]
    async fn create_completion(
        &self,
        request: &CompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<Value, BackendError> {
        self.send_completion(request, timeout)
            .await
            .map_err(Into::into)
    }
}
