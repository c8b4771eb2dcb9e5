use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mmbridge::cli::{Cli, Commands};
use mmbridge::{commands, AppContext};
use mmbridge_extensions::openai::{HostedChatModel, OpenAiClient, OpenAiConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let timeout = Duration::from_secs(cli.timeout);
    let config = OpenAiConfig::new(cli.api_key.clone())
        .and_then(|config| config.base_url(&cli.base_url))
        .context("Invalid endpoint configuration")?
        .timeout(timeout);
    let client = OpenAiClient::new(config, None).context("Failed to create HTTP client")?;
    debug!(model = %cli.model, "Adapter configured");

    let cx = AppContext {
        model: Arc::new(HostedChatModel::new(client, cli.model.clone())),
    };

    match cli.command {
        Commands::Chat(args) => commands::handle_chat(args, timeout, &cx).await?,
        Commands::Info => commands::handle_info(&cx).await?,
    }

    Ok(())
}

/// `RUST_LOG` wins over the verbosity flags when set.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
