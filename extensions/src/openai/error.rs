use mmbridge_core::chat::BackendError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

// ============== OpenAI-style Error Structures ==============

/// The error body returned by OpenAI-compatible servers.
#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiErrorDetail {
    /// Developer-facing error message.
    pub message: String,
    /// e.g. "invalid_request_error", "authentication_error".
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// String on OpenAI itself, sometimes a number on compatible servers.
    #[serde(default)]
    pub code: Option<Value>,
    // `param` is ignored; it only ever echoes a request field name.
}

impl OpenAiErrorDetail {
    fn describe(&self) -> String {
        match (&self.kind, &self.code) {
            // `code: null` is common, treat it as absent
            (Some(kind), Some(code)) if !code.is_null() => {
                format!("{} (type: {}, code: {})", self.message, kind, code)
            }
            (Some(kind), _) => format!("{} (type: {})", self.message, kind),
            _ => self.message.clone(),
        }
    }
}

// ============== Internal Client Error Enum ==============

/// Internal error type for the HTTP client. Converted into [`BackendError`] at the
/// `CompletionBackend` boundary.
#[derive(Error, Debug)]
pub enum OpenAiError {
    /// Connecting, sending, timing out, or reading the body.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to serialize request body: {0}")]
    RequestSerialization(#[source] serde_json::Error),

    /// A 2xx response whose body is not JSON.
    #[error("Failed to parse successful response body ({context}): {source}")]
    ResponseParsing {
        context: String, // What was being parsed, for the log line
        #[source]
        source: serde_json::Error,
    },

    /// Non-success status code.
    #[error("Completion API error: status={status}, message='{body_text}'")]
    ApiError {
        status: StatusCode,
        /// `None` when the body is not the usual `{"error": {...}}` envelope
        /// (proxies and some local servers answer with plain text or HTML).
        detail: Option<OpenAiErrorDetail>,
        body_text: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Turns a non-success response into [`OpenAiError::ApiError`], parsing the error body
/// when it has the expected shape and keeping the raw text either way.
pub(crate) async fn map_response_error(response: reqwest::Response) -> OpenAiError {
    let status = response.status();
    debug_assert!(!status.is_success(), "map_response_error called with success status");

    // The body is consumed here, so the raw text has to be kept on every path
    match response.text().await {
        Ok(body_text) => match serde_json::from_str::<OpenAiErrorResponse>(&body_text) {
            Ok(parsed) => OpenAiError::ApiError {
                status,
                detail: Some(parsed.error),
                body_text,
            },
            Err(parse_err) => {
                warn!(
                    status = %status,
                    error = %parse_err,
                    body = %body_text,
                    "Failed to parse error response JSON, returning raw body."
                );
                OpenAiError::ApiError {
                    status,
                    detail: None,
                    body_text,
                }
            }
        },
        Err(e) => {
            // The status is lost here; a broken body read is reported as a network failure
            warn!(status = %status, error = %e, "Failed to read error response body text.");
            OpenAiError::Network(e)
        }
    }
}

// ============== From<OpenAiError> for BackendError ==============

impl From<OpenAiError> for BackendError {
    fn from(err: OpenAiError) -> Self {
        match err {
            OpenAiError::Network(source) => BackendError::Network(Box::new(source)),
            OpenAiError::RequestSerialization(source) => {
                BackendError::InvalidRequest(format!("Failed to serialize request: {}", source))
            }
            OpenAiError::ResponseParsing { source, .. } => BackendError::Parsing(Box::new(source)),
            OpenAiError::ApiError { status, detail, body_text } => {
                // Prefer the parsed message, fall back to whatever the server sent
                let message = detail.map(|d| d.describe()).unwrap_or(body_text);
                match status {
                    StatusCode::BAD_REQUEST => BackendError::InvalidRequest(message),
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        BackendError::Authentication(message)
                    }
                    StatusCode::NOT_FOUND => BackendError::ModelNotFound(message),
                    StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited(message),
                    // 5xx and anything unusual keep the numeric status
                    _ => BackendError::Api {
                        status: status.as_u16(),
                        message,
                    },
                }
            }
            OpenAiError::InvalidConfiguration(msg) => BackendError::Configuration(msg),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_error(status: StatusCode, body: Value) -> BackendError {
        let body_text = body.to_string();
        let detail = serde_json::from_value::<OpenAiErrorResponse>(body).ok().map(|r| r.error);
        OpenAiError::ApiError { status, detail, body_text }.into()
    }

    #[test]
    fn status_codes_map_to_backend_errors() {
        let body = json!({"error": {"message": "nope", "type": "invalid_request_error", "code": null}});

        assert!(matches!(api_error(StatusCode::BAD_REQUEST, body.clone()), BackendError::InvalidRequest(_)));
        assert!(matches!(api_error(StatusCode::UNAUTHORIZED, body.clone()), BackendError::Authentication(_)));
        assert!(matches!(api_error(StatusCode::FORBIDDEN, body.clone()), BackendError::Authentication(_)));
        assert!(matches!(api_error(StatusCode::NOT_FOUND, body.clone()), BackendError::ModelNotFound(_)));
        assert!(matches!(api_error(StatusCode::TOO_MANY_REQUESTS, body.clone()), BackendError::RateLimited(_)));
        assert!(matches!(
            api_error(StatusCode::SERVICE_UNAVAILABLE, body),
            BackendError::Api { status: 503, .. }
        ));
    }

    #[test]
    fn parsed_detail_is_used_for_the_message() {
        let err = api_error(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"message": "Incorrect API key", "type": "invalid_api_key", "code": "invalid_api_key"}}),
        );
        let BackendError::Authentication(message) = err else {
            panic!("expected Authentication");
        };
        assert!(message.starts_with("Incorrect API key"));
        assert!(message.contains("invalid_api_key"));
    }

    #[test]
    fn unparseable_body_is_kept_verbatim() {
        let err: BackendError = OpenAiError::ApiError {
            status: StatusCode::BAD_GATEWAY,
            detail: None,
            body_text: "<html>upstream down</html>".into(),
        }
        .into();
        assert!(matches!(
            err,
            BackendError::Api { status: 502, ref message } if message == "<html>upstream down</html>"
        ));
    }
}
