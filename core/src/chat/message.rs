use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::ContentError;

/// Prefix every inline image data URI must start with.
pub const DATA_URI_IMAGE_PREFIX: &str = "data:image";

/// The author of a message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn in a conversation.
///
/// The order of `content` is the order in which the blocks are presented to the model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn new(role: MessageRole, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, vec![ContentBlock::text(text)])
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, vec![ContentBlock::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, vec![ContentBlock::text(text)])
    }

    /// Appends a content block, keeping the existing blocks in front of it.
    #[must_use]
    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.content.push(block);
        self
    }

    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_block(ContentBlock::text(text))
    }

    #[must_use]
    pub fn with_image(self, image: impl Into<ImageSource>) -> Self {
        self.with_block(ContentBlock::image(image))
    }

    /// Returns the text of the first text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ContentBlock::as_text)
    }
}

/// One atomic piece of a message's content.
///
/// Serializes as `{"type": "text", "text": ...}` or `{"type": "image", "image": ...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Image { image: ImageSource },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image(image: impl Into<ImageSource>) -> Self {
        ContentBlock::Image { image: image.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Where the pixels of an image block come from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ImageSource {
    /// Raw, unencoded image bytes.
    Bytes(Vec<u8>),
    /// An inline `data:image...` URI.
    DataUri(DataUri),
    /// A remote image reference. Not every backend can dereference these.
    Url(Url),
}

impl ImageSource {
    /// Classifies a loose string as either an inline data URI or a remote URL.
    pub fn parse(source: &str) -> Result<Self, ContentError> {
        if source.starts_with(DATA_URI_IMAGE_PREFIX) {
            return DataUri::parse(source).map(ImageSource::DataUri);
        }
        Url::parse(source)
            .map(ImageSource::Url)
            .map_err(|_| ContentError::InvalidImageSource(preview(source)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImageSource::Bytes(_) => "bytes",
            ImageSource::DataUri(_) => "data URI",
            ImageSource::Url(_) => "URL",
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        ImageSource::Bytes(bytes.to_vec())
    }
}

impl From<DataUri> for ImageSource {
    fn from(uri: DataUri) -> Self {
        ImageSource::DataUri(uri)
    }
}

impl From<Url> for ImageSource {
    fn from(url: Url) -> Self {
        ImageSource::Url(url)
    }
}

/// A string known to start with `data:image`.
///
/// Only the prefix is checked; the payload is carried through byte for byte.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri(String);

impl DataUri {
    pub fn parse(uri: impl Into<String>) -> Result<Self, ContentError> {
        let uri = uri.into();
        if uri.starts_with(DATA_URI_IMAGE_PREFIX) {
            Ok(Self(uri))
        } else {
            Err(ContentError::InvalidDataUri(preview(&uri)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DataUri {
    type Error = ContentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DataUri> for String {
    fn from(uri: DataUri) -> Self {
        uri.0
    }
}

impl FromStr for DataUri {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for DataUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Image payloads can be megabytes long; errors only carry the head.
fn preview(s: &str) -> String {
    const MAX_CHARS: usize = 48;
    match s.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
