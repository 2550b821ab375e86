//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\music-keeper\config.toml
//! - macOS: ~/Library/Application Support/music-keeper/config.toml
//! - Linux: ~/.config/music-keeper/config.toml
//!
//! Settings are loaded once at startup; a missing or unparsable file falls
//! back to defaults with a logged warning rather than surfacing an error.
//! Library data (audio files and the record store) lives under the OS data
//! directory unless overridden.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Library storage settings
    pub library: LibraryConfig,

    /// Playback settings
    pub playback: PlaybackConfig,

    /// Media server settings
    pub server: ServerConfig,
}

/// Library storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Override for the data directory (audio files + record store).
    /// Defaults to the OS data dir + "music-keeper".
    pub data_dir: Option<PathBuf>,
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Master volume slider position (0-100)
    pub master_volume: u8,

    /// Scale playback gain so every track lands at the target loudness
    pub loudness_normalization: bool,

    /// Normalization target in LUFS
    pub target_lufs: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            master_volume: 100,
            loudness_normalization: true,
            target_lufs: -14.0,
        }
    }
}

/// Media server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port for the `serve` command
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 7275 }
    }
}

impl Config {
    /// The directory holding audio files and the record store.
    pub fn data_dir(&self) -> PathBuf {
        self.library.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("music-keeper")
        })
    }

    /// The audio directory inside the data dir.
    pub fn audio_dir(&self) -> PathBuf {
        self.data_dir().join("music")
    }

    /// The record store path inside the data dir.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join(crate::store::DEFAULT_DB_NAME)
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("music-keeper"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk.
///
/// Returns default config if the file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("no config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("failed to parse config file {:?}: {}", path, e);
                tracing::warn!("using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk.
///
/// Creates the config directory if it doesn't exist. Writes atomically
/// (temp file + rename).
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::CreateDir(dir.clone(), e))?;

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| ConfigError::Rename(temp_path, path.clone(), e))?;

    tracing::info!("saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
