use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod render;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.api_url.clone(), cli.font.clone())?;
    debug!("Using detection service at {}", config.api_base_url);

    match cli.command {
        Command::Render(args) => render::run(args, config).await,
        Command::Stats(args) => commands::stats(args, &config).await,
        Command::Export(args) => commands::export(args, &config).await,
        Command::Upload { file, detect } => commands::upload(&file, detect, &config).await,
    }
}
