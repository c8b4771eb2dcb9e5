use std::time::Duration;

use serde_json::{Map, Value};

/// Per-call overrides forwarded to the backend.
///
/// The common sampling parameters have typed fields; anything else goes into `extra`
/// and is merged into the request as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub stop: Option<Vec<String>>,

    /// Request timeout for the backend call. Never sent as a request parameter.
    pub timeout: Option<Duration>,

    /// Backend-specific keyword overrides.
    pub extra: Map<String, Value>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Flattens the options into request parameters.
    ///
    /// Typed fields win over an `extra` entry with the same key.
    pub fn to_params(&self) -> Map<String, Value> {
        let mut params = self.extra.clone();
        if let Some(temperature) = self.temperature {
            params.insert("temperature".into(), Value::from(temperature));
        }
        if let Some(max_tokens) = self.max_tokens {
            params.insert("max_tokens".into(), Value::from(max_tokens));
        }
        if let Some(top_p) = self.top_p {
            params.insert("top_p".into(), Value::from(top_p));
        }
        if let Some(stop) = &self.stop {
            params.insert("stop".into(), Value::from(stop.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_options_produce_no_params() {
        assert!(ChatOptions::default().to_params().is_empty());
    }

    #[test]
    fn typed_fields_override_extra() {
        let options = ChatOptions {
            max_tokens: Some(64),
            stop: Some(vec!["END".into()]),
            ..Default::default()
        }
        .with_extra("max_tokens", 1)
        .with_extra("seed", 7)
        .with_timeout(Duration::from_secs(5));

        let params = options.to_params();
        assert_eq!(params.get("max_tokens"), Some(&json!(64)));
        assert_eq!(params.get("seed"), Some(&json!(7)));
        assert_eq!(params.get("stop"), Some(&json!(["END"])));
        assert!(!params.contains_key("timeout"));
    }

    #[test]
    fn sampling_values_keep_their_decimal_form() {
        let options = ChatOptions {
            temperature: Some(0.2),
            top_p: Some(0.9),
            ..Default::default()
        };

        let params = options.to_params();
        assert_eq!(params.get("temperature"), Some(&json!(0.2)));
        assert_eq!(params.get("top_p"), Some(&json!(0.9)));
    }
}
