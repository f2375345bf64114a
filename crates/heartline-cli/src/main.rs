//! heartline: hold the heart at the same time as your partner, from a
//! terminal.
//!
//! Drives one `SyncSession` from stdin commands. With `--loopback` the
//! session runs against an in-process server alongside a simulated
//! partner that can be steered with `partner ...` commands.

mod app;
mod cli;
mod commands;
mod render;

use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG: &str = "heartline=info";

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let loaded = heartline_config::load_config_from(args.config.as_deref());

    let directive = args
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.logging.level.clone()))
        .unwrap_or_else(|| DEFAULT_LOG.to_string());
    let directive: Directive = directive
        .parse()
        .or_else(|_| DEFAULT_LOG.parse())
        .unwrap_or_else(|_| LevelFilter::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();

    tracing::info!("heartline v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(path) = &args.config {
        tracing::info!(path = %path.display(), "Using config override");
    }
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        heartline_config::HeartlineConfig::default()
    });

    if let Err(e) = app::run(args, config).await {
        tracing::error!("{e}");
        eprintln!("heartline: {e}");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}
