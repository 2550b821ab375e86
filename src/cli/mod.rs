//! Command-line interface for music-keeper.
//!
//! Subcommands cover the library lifecycle (import, list, edit, tag,
//! rename, delete), playlists, history/recommendations, and the `serve`
//! mode that runs the media server for a playback front-end.

mod commands;

pub use commands::{App, Cli, Commands, run_command};
