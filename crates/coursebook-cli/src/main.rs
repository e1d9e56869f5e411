use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coursebook_cli::{cli::Cli, config::CliConfig};
use coursebook_watch::Watcher;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The watcher's own logger decides what it emits, so let it through here.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("coursebook_watch=trace,coursebook_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = CliConfig::load(cli.config.as_deref())?.merge(&cli);

    let watcher = Watcher::new(settings.options)?;
    watcher.set_log_level(settings.log_level);

    let handle = watcher.watch(|path: String| async move {
        println!("File changed: {}", path);
        anyhow::Ok(())
    })?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Interrupted, shutting down");
    drop(handle);

    Ok(())
}
