//! Test utilities and fixtures.
//!
//! Provides a temporary on-disk library (store + audio directory) and a
//! synthetic WAV builder so import tests run against real files without
//! shipping audio fixtures.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use crate::events::EventBus;
use crate::history::HistoryLog;
use crate::library::TrackRepository;
use crate::playlist::PlaylistStore;
use crate::store::Store;

/// Build a minimal valid PCM WAV file around the given payload bytes.
///
/// The header is a real RIFF/WAVE structure (fmt + data chunks), so the
/// file passes magic-byte checks and probes as mono 16-bit 44.1 kHz.
pub fn wav_bytes(payload: &[u8]) -> Vec<u8> {
    let data_len = payload.len() as u32;
    let mut bytes = Vec::with_capacity(44 + payload.len());

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&44100u32.to_le_bytes()); // sample rate
    bytes.extend_from_slice(&88200u32.to_le_bytes()); // byte rate
    bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.extend_from_slice(payload);

    bytes
}

/// A disposable on-disk library: store, audio directory, and a source
/// directory to import from. Everything vanishes when the fixture drops.
pub struct TempLibrary {
    /// Keeps the temp directory alive for the fixture's lifetime
    _dir: TempDir,
    root: PathBuf,
    pub events: EventBus,
    pub repo: Arc<TrackRepository>,
    pub history: HistoryLog,
    pub playlists: PlaylistStore,
}

impl TempLibrary {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp directory");
        let root = dir.path().to_path_buf();

        let store = Store::open(&root.join("library.db"))
            .await
            .expect("failed to open test store");
        let events = EventBus::default();
        let repo = Arc::new(
            TrackRepository::new(store.clone(), root.join("music"), events.clone())
                .expect("failed to create repository"),
        );

        std::fs::create_dir_all(root.join("sources")).unwrap();

        Self {
            history: HistoryLog::new(store.clone()),
            playlists: PlaylistStore::new(store, events.clone()),
            _dir: dir,
            root,
            events,
            repo,
        }
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("music")
    }

    /// A path inside the source directory (which may not exist yet).
    pub fn source_path(&self, name: &str) -> PathBuf {
        self.root.join("sources").join(name)
    }

    /// Write raw bytes as a source file to import from.
    pub fn write_source(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.source_path(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// Write a source file inside a subdirectory (for collision tests where
    /// several sources share a file name).
    pub fn write_source_in(&self, subdir: &str, name: &str, bytes: &[u8]) -> PathBuf {
        let dir = self.root.join("sources").join(subdir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// Import a synthetic WAV built around `payload` and return the new
    /// track's id.
    pub async fn import_one(&self, name: &str, payload: &[u8]) -> String {
        let source = self.write_source(name, &wav_bytes(payload));
        let outcomes = self.repo.import_files(&[source]).await;
        assert_eq!(outcomes.len(), 1);
        outcomes[0]
            .track_id
            .clone()
            .unwrap_or_else(|| panic!("import failed: {:?}", outcomes[0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_bytes_has_valid_header() {
        let bytes = wav_bytes(b"abcd");
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(bytes.len(), 48);
    }

    #[tokio::test]
    async fn test_temp_library_import_roundtrip() {
        let lib = TempLibrary::new().await;
        let id = lib.import_one("fixture.wav", b"fixture-payload").await;

        let track = lib.repo.get(&id).await.unwrap();
        assert_eq!(track.file_name, "fixture.wav");
    }
}
