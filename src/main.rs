//! Music Keeper - a music library manager.
//!
//! Imports audio files with content-hash deduplication, keeps metadata,
//! tags, playlists and play history, and serves playback with loudness
//! normalization and queue modes over a local media endpoint. The
//! windowing shell is a separate front-end; this binary offers the CLI
//! and the `serve` mode it talks to.

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod hash;
pub mod history;
pub mod library;
pub mod loudness;
pub mod metadata;
pub mod model;
pub mod player;
pub mod playlist;
pub mod prompt;
pub mod server;
pub mod store;
pub mod tags;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("music_keeper=info".parse().unwrap()))
        .init();

    let config = config::load();

    // First run: persist the defaults so users have a file to edit
    if config::config_path().is_some_and(|p| !p.exists()) {
        if let Err(e) = config::save(&config) {
            tracing::warn!("could not write default config: {}", e);
        }
    }

    let app = cli::App::init(config).await?;

    cli::run_command(&args, &app).await
}
