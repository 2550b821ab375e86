//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `import`: bring audio files (or whole directories) into the library
//! - `list`: listings with artist and tag filters
//! - `edit`: metadata/tag/rename/delete operations on single tracks
//! - `history`: play history and recommendations
//! - `playlist`: playlist CRUD
//! - `serve`: run the media server with a live playback session

mod edit;
mod history;
mod import;
mod list;
mod playlist;
mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::events::EventBus;
use crate::history::HistoryLog;
use crate::library::TrackRepository;
use crate::playlist::PlaylistStore;
use crate::prompt::ConsolePrompter;
use crate::store::Store;

/// Music Keeper CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Import audio files or directories into the library
    Import {
        /// Files or directories to import
        paths: Vec<PathBuf>,
    },
    /// List library tracks
    List {
        /// Only tracks by this artist (exact match)
        #[arg(long)]
        artist: Option<String>,
        /// Require this tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Exclude tracks carrying this tag (repeatable)
        #[arg(long = "exclude-tag")]
        exclude_tags: Vec<String>,
        /// Match any requested tag instead of all of them
        #[arg(long)]
        any: bool,
    },
    /// Edit a track's title and/or artist
    Edit {
        track_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
    },
    /// Replace a track's tag set
    Tag {
        track_id: String,
        /// The new tags (the previous set is replaced)
        tags: Vec<String>,
    },
    /// Rename a track's file inside the library
    Rename {
        track_id: String,
        new_file_name: String,
    },
    /// Delete a track (removes it from playlists and history too)
    Delete {
        track_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Manage playlists
    Playlist {
        #[command(subcommand)]
        action: PlaylistAction,
    },
    /// Show the retained play history
    History,
    /// Show recommendations from recent listening
    Recommend {
        /// Scoring window in days
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
    /// Run the media server
    Serve {
        /// Port override (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Playlist subcommands
#[derive(Subcommand)]
pub enum PlaylistAction {
    /// Create a new empty playlist
    Create { name: String },
    /// List all playlists
    List,
    /// Show a playlist's tracks
    Show { playlist_id: String },
    /// Append a track to a playlist
    Add {
        playlist_id: String,
        track_id: String,
    },
    /// Remove a track from a playlist
    Remove {
        playlist_id: String,
        track_id: String,
    },
    /// Rename a playlist
    Rename {
        playlist_id: String,
        new_name: String,
    },
    /// Delete a playlist
    Delete { playlist_id: String },
}

/// Shared handles built once at startup.
pub struct App {
    pub config: Config,
    pub events: EventBus,
    pub repo: Arc<TrackRepository>,
    pub history: HistoryLog,
    pub playlists: PlaylistStore,
}

impl App {
    /// Open the store and wire up the library handles.
    pub async fn init(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config.data_dir())?;
        let store = Store::open(&config.store_path()).await?;
        let events = EventBus::default();
        let repo = Arc::new(TrackRepository::new(
            store.clone(),
            config.audio_dir(),
            events.clone(),
        )?);

        Ok(Self {
            history: HistoryLog::new(store.clone()),
            playlists: PlaylistStore::new(store, events.clone()),
            config,
            events,
            repo,
        })
    }
}

/// Execute the selected subcommand.
pub async fn run_command(cli: &Cli, app: &App) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Import { paths } => import::cmd_import(app, paths).await,
        Commands::List {
            artist,
            tags,
            exclude_tags,
            any,
        } => list::cmd_list(app, artist.as_deref(), tags, exclude_tags, *any).await,
        Commands::Edit {
            track_id,
            title,
            artist,
        } => edit::cmd_edit(app, track_id, title.clone(), artist.clone()).await,
        Commands::Tag { track_id, tags } => edit::cmd_tag(app, track_id, tags.clone()).await,
        Commands::Rename {
            track_id,
            new_file_name,
        } => edit::cmd_rename(app, track_id, new_file_name).await,
        Commands::Delete { track_id, yes } => {
            edit::cmd_delete(app, track_id, *yes, &ConsolePrompter).await
        }
        Commands::Playlist { action } => playlist::cmd_playlist(app, action).await,
        Commands::History => history::cmd_history(app).await,
        Commands::Recommend { days } => history::cmd_recommend(app, *days).await,
        Commands::Serve { port } => serve::cmd_serve(app, *port).await,
    }
}
