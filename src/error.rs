//! Application-wide error types.
//!
//! Library modules return structured errors via `thiserror`; the CLI/main
//! boundary uses `anyhow` for convenient propagation. Single-entity
//! operations (update/rename/delete) surface a `Result` rather than
//! panicking so callers can render inline messages; batch import converts
//! per-file errors into structured outcomes instead (see
//! [`crate::library::ImportOutcome`]).

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown track or playlist id
    #[error("not found: {0}")]
    NotFound(String),

    /// Filename collision on rename
    #[error("conflict: {0}")]
    Conflict(String),

    /// Disk read/write/copy/rename failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tag/metadata parse failure or audio stream open failure
    #[error("decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Empty required field (playlist name, track title, ...)
    #[error("validation error: {0}")]
    Validation(String),

    /// Persistent store failure
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Record serialization failure in the store
    #[error("store encoding error: {0}")]
    StoreEncoding(#[from] serde_json::Error),
}

impl Error {
    /// Create a not-found error for a track or playlist id.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a decode error.
    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("track abc123");
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_decode_error_includes_path() {
        let err = Error::decode("/music/song.mp3", "unsupported format");
        let msg = err.to_string();
        assert!(msg.contains("song.mp3"));
        assert!(msg.contains("unsupported format"));
    }

    #[test]
    fn test_conflict_error() {
        let err = Error::conflict("file name already in use: track.mp3");
        assert!(err.to_string().contains("track.mp3"));
    }
}
