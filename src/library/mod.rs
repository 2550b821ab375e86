//! Track repository: library records and their audio files.
//!
//! The repository owns the `tracks` collection and the audio directory; a
//! track's bytes and its record live together, keyed by a content hash so
//! the same audio never enters the library twice. Batch import has
//! per-file failure semantics — one unreadable file never aborts the rest —
//! while single-entity operations return structured errors the shell can
//! render inline.
//!
//! Deleting a track is the one place the repository reaches into the other
//! collections: the id is stripped from history and from every playlist,
//! best-effort, so the library does not create dangling references on its
//! own initiative. Readers still filter defensively (a crash between
//! cascade steps leaves strays behind).

use chrono::Utc;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::history::HistoryLog;
use crate::model::{Track, TrackMetadata, TrackWithPath};
use crate::playlist::PlaylistStore;
use crate::store::{Store, collections};
use crate::tags::TagFilter;
use crate::{hash, loudness, metadata};

/// Extensions accepted by import (case-insensitive).
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "m4a"];

/// Artist stored when a file carries no artist tag.
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Per-file import status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    /// A new track was added
    Ok,
    /// Content already in the library; nothing was written
    Duplicate,
    /// This file failed; the batch continued
    Error,
}

/// Per-file outcome of a batch import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub status: ImportStatus,
    pub file: PathBuf,
    /// The new track's id, or the existing one on `Duplicate`
    pub track_id: Option<String>,
    pub error: Option<String>,
}

impl ImportOutcome {
    /// Whether this file produced a new track.
    pub fn success(&self) -> bool {
        self.status == ImportStatus::Ok
    }
}

/// The track repository.
pub struct TrackRepository {
    store: Store,
    audio_dir: PathBuf,
    events: EventBus,
    history: HistoryLog,
    playlists: PlaylistStore,
    /// Serializes hash-lookup + insert so racing imports of the same
    /// content cannot both succeed
    import_lock: Mutex<()>,
}

impl TrackRepository {
    /// Create a repository over the store, ensuring the audio directory
    /// exists.
    pub fn new(store: Store, audio_dir: PathBuf, events: EventBus) -> Result<Self> {
        std::fs::create_dir_all(&audio_dir)?;
        Ok(Self {
            history: HistoryLog::new(store.clone()),
            playlists: PlaylistStore::new(store.clone(), events.clone()),
            store,
            audio_dir,
            events,
            import_lock: Mutex::new(()),
        })
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    // ------------------------------------------------------------------
    // Import
    // ------------------------------------------------------------------

    /// Import a batch of audio files, one outcome per path.
    ///
    /// Files are processed sequentially; each failure is caught and
    /// reported in its outcome without touching the remaining paths.
    pub async fn import_files(&self, paths: &[PathBuf]) -> Vec<ImportOutcome> {
        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            let outcome = match self.import_one(path).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!("import failed for {}: {}", path.display(), e);
                    ImportOutcome {
                        status: ImportStatus::Error,
                        file: path.clone(),
                        track_id: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn import_one(&self, path: &Path) -> Result<ImportOutcome> {
        if !is_audio_file(path)? {
            return Err(Error::decode(path, "not a recognized audio format"));
        }

        let file_hash = hash::hash_file(path)?;

        // Hash-lookup and insert must not interleave with another import of
        // the same content
        let _guard = self.import_lock.lock().await;

        if let Some(existing) = self.find_by_hash(&file_hash).await? {
            tracing::info!(
                "skipping duplicate {} (already track {})",
                path.display(),
                existing.id
            );
            return Ok(ImportOutcome {
                status: ImportStatus::Duplicate,
                file: path.to_path_buf(),
                track_id: Some(existing.id),
                error: None,
            });
        }

        let desired_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::validation(format!("unusable file name: {}", path.display())))?;
        let file_name = self.free_file_name(desired_name);
        let dest = self.audio_dir.join(&file_name);
        std::fs::copy(path, &dest)?;

        // Metadata is best-effort: a broken tag block falls back to
        // stem/"Unknown Artist"/0
        let embedded = metadata::read(&dest).unwrap_or_else(|e| {
            tracing::warn!("metadata read failed for {}: {}", dest.display(), e);
            Default::default()
        });
        let stem = Path::new(desired_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(desired_name)
            .to_string();

        let volume_lufs = loudness::measure(&dest).await;

        let track = Track {
            id: Uuid::new_v4().to_string(),
            file_hash,
            file_name,
            metadata: TrackMetadata {
                title: embedded.title.unwrap_or(stem),
                artist: embedded.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                duration_secs: embedded.duration_secs,
                volume_lufs,
            },
            tags: Vec::new(),
            added_at: Utc::now().timestamp_millis(),
        };
        self.store.set(collections::TRACKS, &track.id, &track).await?;

        tracing::info!("imported '{}' as {}", track.metadata.title, track.id);
        self.events.emit(Event::TrackAdded {
            track_id: track.id.clone(),
        });

        Ok(ImportOutcome {
            status: ImportStatus::Ok,
            file: path.to_path_buf(),
            track_id: Some(track.id),
            error: None,
        })
    }

    /// First free file name in the audio directory: the desired name, or
    /// `stem_1.ext`, `stem_2.ext`, ... probed sequentially.
    fn free_file_name(&self, desired: &str) -> String {
        if !self.audio_dir.join(desired).exists() {
            return desired.to_string();
        }

        let (stem, ext) = match desired.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (desired, None),
        };

        let mut counter = 1;
        loop {
            let candidate = match ext {
                Some(ext) => format!("{stem}_{counter}.{ext}"),
                None => format!("{stem}_{counter}"),
            };
            if !self.audio_dir.join(&candidate).exists() {
                return candidate;
            }
            counter += 1;
        }
    }

    // ------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------

    /// Fetch a track by id.
    pub async fn get(&self, track_id: &str) -> Result<Track> {
        self.store
            .get(collections::TRACKS, track_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("track {track_id}")))
    }

    /// All live tracks with their resolved paths, oldest first.
    ///
    /// Records whose backing file has vanished from the audio directory are
    /// filtered out, not deleted.
    pub async fn list_all(&self) -> Result<Vec<TrackWithPath>> {
        let mut tracks: Vec<Track> = self.store.all(collections::TRACKS).await?;
        tracks.sort_by_key(|t| t.added_at);

        Ok(tracks
            .into_iter()
            .filter_map(|track| {
                let path = self.audio_dir.join(&track.file_name);
                path.is_file().then_some(TrackWithPath { track, path })
            })
            .collect())
    }

    /// Live tracks by exact artist match.
    pub async fn list_by_artist(&self, artist: &str) -> Result<Vec<TrackWithPath>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|t| t.track.metadata.artist == artist)
            .collect())
    }

    /// Live tracks passing a tag filter.
    pub async fn filter_by_tags(&self, filter: &TagFilter) -> Result<Vec<TrackWithPath>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|t| filter.matches(&t.track))
            .collect())
    }

    async fn find_by_hash(&self, file_hash: &str) -> Result<Option<Track>> {
        let tracks: Vec<Track> = self.store.all(collections::TRACKS).await?;
        Ok(tracks.into_iter().find(|t| t.file_hash == file_hash))
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Merge a metadata patch into a track and rewrite the changed on-file
    /// tag fields.
    pub async fn update_metadata(&self, track_id: &str, patch: MetadataPatch) -> Result<Track> {
        let mut track = self.get(track_id).await?;

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(Error::validation("title must not be empty"));
            }
        }

        let new_title = patch.title.filter(|t| *t != track.metadata.title);
        let new_artist = patch.artist.filter(|a| *a != track.metadata.artist);
        if new_title.is_none() && new_artist.is_none() {
            return Ok(track);
        }

        if let Some(title) = &new_title {
            track.metadata.title = title.clone();
        }
        if let Some(artist) = &new_artist {
            track.metadata.artist = artist.clone();
        }
        self.store.set(collections::TRACKS, &track.id, &track).await?;

        // On-file tags follow the record; a file that rejects the write
        // stays importable and the record remains authoritative
        let path = self.audio_dir.join(&track.file_name);
        if let Err(e) = metadata::write(&path, new_title.as_deref(), new_artist.as_deref()) {
            tracing::warn!("tag rewrite failed for {}: {}", path.display(), e);
        }

        self.events.emit(Event::TrackUpdated {
            track_id: track.id.clone(),
        });
        Ok(track)
    }

    /// Rename a track's file on disk, deriving a fresh title from the new
    /// name.
    pub async fn rename_file(&self, track_id: &str, new_file_name: &str) -> Result<Track> {
        let mut track = self.get(track_id).await?;

        let new_file_name = new_file_name.trim();
        if new_file_name.is_empty() {
            return Err(Error::validation("file name must not be empty"));
        }
        if new_file_name == track.file_name {
            return Ok(track);
        }

        let source = self.audio_dir.join(&track.file_name);
        let dest = self.audio_dir.join(new_file_name);
        if dest.exists() {
            return Err(Error::conflict(format!(
                "file name already in use: {new_file_name}"
            )));
        }

        std::fs::rename(&source, &dest)?;

        track.file_name = new_file_name.to_string();
        track.metadata.title = Path::new(new_file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(new_file_name)
            .to_string();
        self.store.set(collections::TRACKS, &track.id, &track).await?;

        if let Err(e) = metadata::write(&dest, Some(&track.metadata.title), None) {
            tracing::warn!("tag rewrite failed for {}: {}", dest.display(), e);
        }

        self.events.emit(Event::TrackUpdated {
            track_id: track.id.clone(),
        });
        Ok(track)
    }

    /// Replace a track's tag set (full replace, not merge).
    pub async fn update_tags(&self, track_id: &str, tags: Vec<String>) -> Result<Track> {
        let mut track = self.get(track_id).await?;
        track.tags = tags;
        self.store.set(collections::TRACKS, &track.id, &track).await?;

        self.events.emit(Event::TrackUpdated {
            track_id: track.id.clone(),
        });
        Ok(track)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a track: audio file, record, and every reference to the id in
    /// history and playlists.
    ///
    /// The cascade steps are separate store writes; a failure mid-way
    /// leaves dangling references behind (readers filter them), so later
    /// steps still run.
    pub async fn delete(&self, track_id: &str) -> Result<()> {
        let track = self.get(track_id).await?;

        let path = self.audio_dir.join(&track.file_name);
        if path.is_file() {
            std::fs::remove_file(&path)?;
        }

        self.store.delete(collections::TRACKS, track_id).await?;

        if let Err(e) = self.history.strip_track(track_id).await {
            tracing::error!("history cleanup failed for {}: {}", track_id, e);
        }
        if let Err(e) = self.playlists.strip_track(track_id).await {
            tracing::error!("playlist cleanup failed for {}: {}", track_id, e);
        }

        tracing::info!("deleted '{}' ({})", track.metadata.title, track_id);
        self.events.emit(Event::TrackDeleted {
            track_id: track_id.to_string(),
        });
        Ok(())
    }
}

/// A partial metadata update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub title: Option<String>,
    pub artist: Option<String>,
}

// ----------------------------------------------------------------------
// File inspection
// ----------------------------------------------------------------------

/// Expand files and directories into a flat list of audio file paths.
///
/// Directories are walked recursively, keeping files with a known audio
/// extension (case-insensitive). Plain file arguments pass through
/// untouched so import can report a per-file error for them.
pub fn expand_audio_paths(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && has_audio_extension(entry.path()) {
                    paths.push(entry.path().to_path_buf());
                }
            }
        } else {
            paths.push(input.clone());
        }
    }
    paths
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check extension and magic bytes before accepting a file for import.
fn is_audio_file(path: &Path) -> Result<bool> {
    if !has_audio_extension(path) {
        return Ok(false);
    }

    let mut file = File::open(path)?;
    let mut buffer = [0u8; 12];
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read < 4 {
        return Ok(false); // too small to be audio
    }

    let is_audio = match &buffer[..bytes_read.min(12)] {
        // MP3
        [0xFF, 0xFB, ..] | [0xFF, 0xF3, ..] | [0xFF, 0xF2, ..] => true,
        [b'I', b'D', b'3', ..] => true, // MP3 with ID3 tag

        // FLAC
        [b'f', b'L', b'a', b'C', ..] => true,

        // OGG
        [b'O', b'g', b'g', b'S', ..] => true,

        // M4A (MP4 container)
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => true,

        // WAV
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E'] => true,

        _ => false,
    };

    Ok(is_audio)
}
