use clap::{Args, Parser, Subcommand};
use mmbridge_core::chat::ImageSource;
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// mmbridge: Send text and images to a hosted chat-completions endpoint.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the OpenAI-compatible API, including the version segment.
    #[arg(long, env = "MMBRIDGE_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// API key sent as a bearer token. Leave empty for servers without auth.
    #[arg(long, env = "MMBRIDGE_API_KEY", hide_env_values = true, default_value = "", global = true)]
    pub api_key: String,

    /// Model identifier passed to the endpoint.
    #[arg(long, short, env = "MMBRIDGE_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 60, global = true)]
    pub timeout: u64,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one message (text plus optional images) and print the reply.
    Chat(ChatArgs),
    /// Show what the configured model advertises.
    Info,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// The text of the user message.
    #[arg(required = true)]
    pub prompt: String,

    /// Image file to attach. Repeatable; images are placed before the prompt text.
    #[arg(long, short)]
    pub image: Vec<PathBuf>,

    /// Image given inline as a `data:image/...` URI, or as a remote URL. Repeatable;
    /// placed after the image files.
    #[arg(long = "image-uri", value_parser = parse_image_source)]
    pub image_uri: Vec<ImageSource>,

    /// Optional system message sent before the user message.
    #[arg(long, short)]
    pub system: Option<String>,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Extra request parameter as KEY=VALUE. VALUE is parsed as JSON, falling back to a string.
    #[arg(long = "option", short = 'o', value_parser = parse_key_value)]
    pub options: Vec<(String, Value)>,

    /// Print the full backend response as JSON instead of the reply text.
    #[arg(long)]
    pub raw: bool,
}

pub fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn parse_image_source(s: &str) -> Result<ImageSource, String> {
    ImageSource::parse(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_value_parses_json_or_string() {
        assert_eq!(parse_key_value("seed=42").unwrap(), ("seed".to_string(), json!(42)));
        assert_eq!(
            parse_key_value("response_format={\"type\":\"json_object\"}").unwrap().1,
            json!({"type": "json_object"})
        );
        assert_eq!(parse_key_value("user=alice").unwrap().1, json!("alice"));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=1").is_err());
    }

    #[test]
    fn chat_command_parses() {
        let cli = Cli::try_parse_from([
            "mmbridge", "chat", "--image", "cat.png", "-i", "dog.jpg", "-o", "seed=1",
            "--model", "my-mm-model", "What is in this image?",
        ])
        .unwrap();

        assert_eq!(cli.model, "my-mm-model");
        let Commands::Chat(args) = cli.command else {
            panic!("expected chat command");
        };
        assert_eq!(args.prompt, "What is in this image?");
        assert_eq!(args.image, vec![PathBuf::from("cat.png"), PathBuf::from("dog.jpg")]);
        assert_eq!(args.options, vec![("seed".to_string(), json!(1))]);
    }

    #[test]
    fn image_uri_accepts_data_uris_and_urls() {
        let cli = Cli::try_parse_from([
            "mmbridge", "chat", "--image-uri", "data:image/png;base64,AAAA",
            "--image-uri", "https://example.com/cat.png", "Describe",
        ])
        .unwrap();

        let Commands::Chat(args) = cli.command else {
            panic!("expected chat command");
        };
        assert_eq!(args.image_uri.len(), 2);
        assert_eq!(args.image_uri[0].kind(), "data URI");
        assert_eq!(args.image_uri[1].kind(), "URL");
    }

    #[test]
    fn image_uri_rejects_plain_paths() {
        let err = Cli::try_parse_from(["mmbridge", "chat", "--image-uri", "cat.png", "Describe"])
            .unwrap_err();
        assert!(err.to_string().contains("cat.png"));
    }

    #[test]
    fn chat_requires_prompt() {
        assert!(Cli::try_parse_from(["mmbridge", "chat"]).is_err());
    }
}
