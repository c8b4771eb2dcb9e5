use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use mmbridge_core::chat::{
    ChatOptions, ChatResponse, ContentBlock, ImageSource, Message, MessageRole,
};
use tracing::{debug, info};

use crate::cli::ChatArgs;
use crate::AppContext;

pub async fn handle_chat(args: ChatArgs, timeout: Duration, cx: &AppContext) -> Result<()> {
    let mut images = Vec::with_capacity(args.image.len() + args.image_uri.len());
    for path in &args.image {
        images.push(ImageSource::Bytes(read_image(path).await?));
    }
    images.extend(args.image_uri.iter().cloned());

    let messages = build_messages(args.system.clone(), images, args.prompt.clone());
    let options = build_options(&args, timeout);
    info!(messages = messages.len(), "Sending chat request");

    let response = cx.model.chat(&messages, &options).await?;
    println!("{}", render_response(&response, args.raw)?);
    Ok(())
}

pub async fn handle_info(cx: &AppContext) -> Result<()> {
    let metadata = cx.model.metadata();
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

async fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read image");
    Ok(bytes)
}

/// Builds the conversation: optional system message, then one user message with the
/// images first and the prompt last.
pub fn build_messages(
    system: Option<String>,
    images: Vec<ImageSource>,
    prompt: String,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(Message::system(system));
    }

    let mut content: Vec<ContentBlock> = images.into_iter().map(ContentBlock::image).collect();
    content.push(ContentBlock::text(prompt));
    messages.push(Message::new(MessageRole::User, content));
    messages
}

pub fn build_options(args: &ChatArgs, timeout: Duration) -> ChatOptions {
    ChatOptions {
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        timeout: Some(timeout),
        extra: args.options.iter().cloned().collect(),
        ..Default::default()
    }
}

pub fn render_response(response: &ChatResponse, raw: bool) -> Result<String> {
    if raw {
        Ok(serde_json::to_string_pretty(&response.raw)?)
    } else {
        Ok(response.text().unwrap_or_default().to_string())
    }
}
