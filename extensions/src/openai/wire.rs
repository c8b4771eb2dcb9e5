use base64::Engine;
use mmbridge_core::chat::{BackendError, ContentBlock, ImageSource, Message};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};


// ============== Chat Completions Request Structs ==============
// These structs mirror the `/chat/completions` request body.

/// The body of a `/chat/completions` request.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    /// Caller-supplied parameters, merged into the top level of the body.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub role: String, // "system", "user", "assistant"
    pub content: Vec<WirePart>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WirePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl {
    pub url: String,
}

/// Why a block could not be translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnsupportedBlock {
    pub block_index: usize,
    pub reason: String,
}

impl WireMessage {
    /// Translates one message, keeping block order.
    ///
    /// Fails on the first block that has no wire representation.
    pub(crate) fn try_from_message(message: &Message) -> Result<Self, UnsupportedBlock> {
        let content = message
            .content
            .iter()
            .enumerate()
            .map(|(block_index, block)| {
                WirePart::try_from_block(block)
                    .map_err(|reason| UnsupportedBlock { block_index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(WireMessage {
            role: message.role.as_str().to_string(),
            content,
        })
    }
}

impl WirePart {
    fn try_from_block(block: &ContentBlock) -> Result<Self, String> {
        match block {
            ContentBlock::Text { text } => Ok(WirePart::Text { text: text.clone() }),
            ContentBlock::Image { image } => match image {
                ImageSource::Bytes(bytes) => Ok(WirePart::image_url(encode_png_data_uri(bytes))),
                ImageSource::DataUri(uri) => Ok(WirePart::image_url(uri.as_str())),
                ImageSource::Url(url) => Err(format!(
                    "image given as a remote {} ({url}); only raw bytes or 'data:image' URIs are accepted",
                    image.kind()
                )),
            },
        }
    }

    fn image_url(url: impl Into<String>) -> Self {
        WirePart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Encodes raw image bytes as a PNG data URI.
///
/// The mime type is always `image/png`; the bytes are not inspected.
pub fn encode_png_data_uri(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime::IMAGE_PNG, encoded)
}


// ============== Chat Completions Response Structs ==============
// Only the fields the adapter reads. Everything else stays in the raw value.

#[derive(Deserialize, Debug)]
pub(crate) struct CompletionResponse {
    // Left untyped so that later choices are never inspected.
    #[serde(default)]
    choices: Vec<Value>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

impl CompletionResponse {
    /// Returns the first choice's message text, untrimmed.
    pub(crate) fn into_first_text(self) -> Result<String, BackendError> {
        let first = self.choices.into_iter().next().ok_or(BackendError::NoChoices)?;
        let choice: CompletionChoice = serde_json::from_value(first)
            .map_err(|e| BackendError::MalformedResponse(format!("first choice: {e}")))?;
        let content = choice
            .message
            .ok_or_else(|| BackendError::MalformedResponse("first choice has no message".into()))?
            .content;

        match content {
            Some(Value::String(text)) => Ok(text),
            Some(Value::Null) | None => Err(BackendError::MalformedResponse(
                "first choice has no message content".into(),
            )),
            Some(other) => Err(BackendError::MalformedResponse(format!(
                "first choice content is not a string: {other}"
            ))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use mmbridge_core::chat::{DataUri, MessageRole};
    use serde_json::json;
    use url::Url;

    fn parse_response(value: Value) -> Result<String, BackendError> {
        serde_json::from_value::<CompletionResponse>(value)
            .unwrap()
            .into_first_text()
    }

    #[test]
    fn text_blocks_keep_order() {
        let message = Message::user("one").with_text("two").with_text("three");
        let wire = WireMessage::try_from_message(&message).unwrap();
        assert_eq!(wire.role, "user");
        assert_eq!(
            wire.content,
            vec![
                WirePart::Text { text: "one".into() },
                WirePart::Text { text: "two".into() },
                WirePart::Text { text: "three".into() },
            ]
        );
    }

    #[test]
    fn raw_bytes_become_png_data_uri() {
        let bytes = vec![0x89, b'P', b'N', b'G', 0, 255, 17];
        let message = Message::new(MessageRole::User, vec![ContentBlock::image(bytes.clone())]);
        let wire = WireMessage::try_from_message(&message).unwrap();

        let WirePart::ImageUrl { image_url } = &wire.content[0] else {
            panic!("expected image_url part");
        };
        let payload = image_url.url.strip_prefix("data:image/png;base64,").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn png_mime_is_declared_even_for_jpeg_bytes() {
        let jpeg_magic = [0xFF, 0xD8, 0xFF, 0xE0];
        assert!(encode_png_data_uri(&jpeg_magic).starts_with("data:image/png;base64,"));
    }

    #[test]
    fn data_uri_passes_through_unchanged() {
        let raw = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";
        let message = Message::new(
            MessageRole::User,
            vec![ContentBlock::image(DataUri::parse(raw).unwrap())],
        );
        let wire = WireMessage::try_from_message(&message).unwrap();
        assert_eq!(
            wire.content,
            vec![WirePart::ImageUrl { image_url: ImageUrl { url: raw.into() } }]
        );
    }

    #[test]
    fn remote_url_is_rejected_with_block_index() {
        let message = Message::user("look")
            .with_image(Url::parse("https://example.com/cat.png").unwrap());
        let err = WireMessage::try_from_message(&message).unwrap_err();
        assert_eq!(err.block_index, 1);
        assert!(err.reason.contains("https://example.com/cat.png"));
    }

    #[test]
    fn request_serializes_with_flattened_options() {
        let mut options = Map::new();
        options.insert("temperature".into(), json!(0.5));
        let request = CompletionRequest {
            model: "my-mm-model".into(),
            messages: vec![WireMessage {
                role: "user".into(),
                content: vec![
                    WirePart::image_url("data:image/png;base64,AAAA"),
                    WirePart::Text { text: "Describe".into() },
                ],
            }],
            options,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "my-mm-model",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}},
                        {"type": "text", "text": "Describe"}
                    ]
                }],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn first_choice_text_is_taken_verbatim() {
        let text = parse_response(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "  A cat.\n"}},
                {"message": {"role": "assistant", "content": "A dog."}}
            ]
        }))
        .unwrap();
        assert_eq!(text, "  A cat.\n");
    }

    #[test]
    fn later_choices_are_not_inspected() {
        let text = parse_response(json!({
            "choices": [{"message": {"content": "A cat."}}, {"message": 42}, "junk"]
        }))
        .unwrap();
        assert_eq!(text, "A cat.");
    }

    #[test]
    fn malformed_first_choice_is_reported() {
        assert!(matches!(
            parse_response(json!({"choices": [{"message": 42}, {"message": {"content": "A dog."}}]})),
            Err(BackendError::MalformedResponse(_))
        ));
    }

    #[test]
    fn empty_reply_text_is_accepted() {
        let text = parse_response(json!({"choices": [{"message": {"content": ""}}]})).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn zero_choices_is_an_error() {
        assert!(matches!(parse_response(json!({"choices": []})), Err(BackendError::NoChoices)));
        assert!(matches!(parse_response(json!({"id": "x"})), Err(BackendError::NoChoices)));
    }

    #[test]
    fn missing_or_non_string_content_is_malformed() {
        assert!(matches!(
            parse_response(json!({"choices": [{"message": {"content": null}}]})),
            Err(BackendError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(json!({"choices": [{"finish_reason": "stop"}]})),
            Err(BackendError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(json!({"choices": [{"message": {"content": [1, 2]}}]})),
            Err(BackendError::MalformedResponse(_))
        ));
    }
}
