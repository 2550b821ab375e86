//! Core data models for the music library.
//!
//! Defines the primary records: [`Track`], [`HistoryEntry`], and
//! [`Playlist`]. All of them serialize with serde for the persistent store.
//!
//! Ownership rules:
//! - the track repository owns `Track` records and the audio-directory bytes,
//! - playlists reference tracks by id only and may dangle after a failed
//!   cascade; readers filter dangling ids at read time,
//! - the playback queue holds a transient snapshot of tracks and never
//!   writes back.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Embedded metadata of a track, as stored in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title (from tags, or derived from the file name)
    pub title: String,
    /// Artist name ("Unknown Artist" when the file carries none)
    pub artist: String,
    /// Duration in seconds (0.0 when the file could not be probed)
    pub duration_secs: f64,
    /// Integrated loudness in LUFS, used for playback normalization
    pub volume_lufs: f64,
}

/// A track in the music library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Opaque unique id (uuid v4), immutable once assigned
    pub id: String,
    /// Content digest over the audio payload, unique across the library
    pub file_hash: String,
    /// File name inside the library's audio directory
    pub file_name: String,
    /// Embedded metadata
    pub metadata: TrackMetadata,
    /// User tags, canonical display order; membership is set-like
    pub tags: Vec<String>,
    /// Import timestamp, epoch milliseconds UTC
    pub added_at: i64,
}

impl Track {
    /// Membership check against the tag set.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A track together with its resolved on-disk path.
///
/// Returned by listings; a [`Track`] whose file vanished from the audio
/// directory never appears in one of these.
#[derive(Debug, Clone)]
pub struct TrackWithPath {
    pub track: Track,
    pub path: PathBuf,
}

/// One play event in the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub track_id: String,
    /// Epoch milliseconds UTC
    pub played_at: i64,
}

/// A named, ordered collection of track references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    /// Opaque unique id (uuid v4)
    pub id: String,
    pub name: String,
    /// Ordered track ids; may reference tracks that no longer exist
    pub track_ids: Vec<String>,
    /// Creation timestamp, epoch milliseconds UTC
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_tag_is_case_sensitive() {
        let track = Track {
            id: "t1".to_string(),
            file_hash: "h1".to_string(),
            file_name: "song.mp3".to_string(),
            metadata: TrackMetadata {
                title: "Song".to_string(),
                artist: "Artist".to_string(),
                duration_secs: 180.0,
                volume_lufs: -14.0,
            },
            tags: vec!["Pop".to_string()],
            added_at: 0,
        };

        assert!(track.has_tag("Pop"));
        assert!(!track.has_tag("pop"));
    }

    #[test]
    fn test_track_roundtrips_through_json() {
        let track = Track {
            id: "t1".to_string(),
            file_hash: "deadbeef".to_string(),
            file_name: "song.mp3".to_string(),
            metadata: TrackMetadata {
                title: "Song".to_string(),
                artist: "Artist".to_string(),
                duration_secs: 1.5,
                volume_lufs: -9.2,
            },
            tags: vec!["a".to_string(), "b".to_string()],
            added_at: 1234,
        };

        let json = serde_json::to_string(&track).unwrap();
        let back: Track = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, track.id);
        assert_eq!(back.metadata, track.metadata);
        assert_eq!(back.tags, track.tags);
    }
}
