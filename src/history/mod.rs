//! Play history log and recommendation scoring.
//!
//! The history collection holds a single ordered log of play events. Every
//! append prunes entries older than the retention window in the same store
//! write — there is no separate sweep job.
//!
//! Recommendations rank library tracks by recent listening behavior. The
//! ranking is suppressed entirely for small histories or small libraries;
//! a top-10 over three plays is noise, not a recommendation.

use chrono::Utc;
use std::collections::HashMap;

use crate::error::Result;
use crate::model::{HistoryEntry, Track};
use crate::store::{Store, collections};

/// Days a play event is retained.
pub const RETENTION_DAYS: i64 = 30;

/// Minimum in-window plays before recommendations are produced.
const MIN_HISTORY_ENTRIES: usize = 5;
/// Minimum library size before recommendations are produced.
const MIN_LIBRARY_TRACKS: usize = 5;
/// Ranking length cap.
const MAX_RECOMMENDATIONS: usize = 10;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Storage key of the single log record inside the history collection.
const LOG_KEY: &str = "log";

/// Handle to the persisted play history.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    store: Store,
}

impl HistoryLog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Record a play of `track_id` now, pruning expired entries in the same
    /// write.
    pub async fn add(&self, track_id: &str) -> Result<()> {
        self.add_at(track_id, Utc::now().timestamp_millis()).await
    }

    /// Record a play at an explicit timestamp (epoch ms).
    pub async fn add_at(&self, track_id: &str, played_at: i64) -> Result<()> {
        let mut log = self.load().await?;
        log.push(HistoryEntry {
            track_id: track_id.to_string(),
            played_at,
        });

        let cutoff = played_at - RETENTION_DAYS * MS_PER_DAY;
        log.retain(|entry| entry.played_at >= cutoff);

        self.store.set(collections::HISTORY, LOG_KEY, &log).await
    }

    /// The full retained log, oldest first.
    pub async fn all(&self) -> Result<Vec<HistoryEntry>> {
        self.load().await
    }

    /// Remove every entry referencing `track_id`. Part of the repository's
    /// delete cascade.
    pub async fn strip_track(&self, track_id: &str) -> Result<()> {
        let mut log = self.load().await?;
        let before = log.len();
        log.retain(|entry| entry.track_id != track_id);
        if log.len() != before {
            self.store.set(collections::HISTORY, LOG_KEY, &log).await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .store
            .get(collections::HISTORY, LOG_KEY)
            .await?
            .unwrap_or_default())
    }
}

/// Rank tracks by in-window listening behavior; at most 10 results.
///
/// Returns an empty ranking unless the window holds at least 5 plays and the
/// library at least 5 tracks. Each track scores four independently
/// normalized signals:
///
/// - play count relative to the most-played track,
/// - the artist's aggregate play count relative to the most-played artist,
/// - tag affinity relative to the best possible tag score,
/// - recency of addition, decaying linearly to zero at the window boundary.
///
/// Ties keep input order (stable sort).
pub fn recommend(
    window_days: i64,
    tracks: &[Track],
    history: &[HistoryEntry],
    now_ms: i64,
) -> Vec<Track> {
    let window_ms = window_days * MS_PER_DAY;
    let cutoff = now_ms - window_ms;

    let in_window: Vec<&HistoryEntry> =
        history.iter().filter(|e| e.played_at >= cutoff).collect();

    if in_window.len() < MIN_HISTORY_ENTRIES || tracks.len() < MIN_LIBRARY_TRACKS {
        return Vec::new();
    }

    let mut play_counts: HashMap<&str, u32> = HashMap::new();
    for entry in &in_window {
        *play_counts.entry(entry.track_id.as_str()).or_default() += 1;
    }

    let mut artist_counts: HashMap<&str, u32> = HashMap::new();
    let mut tag_counts: HashMap<&str, u32> = HashMap::new();
    for track in tracks {
        let plays = play_counts.get(track.id.as_str()).copied().unwrap_or(0);
        if plays == 0 {
            continue;
        }
        *artist_counts.entry(track.metadata.artist.as_str()).or_default() += plays;
        for tag in &track.tags {
            *tag_counts.entry(tag.as_str()).or_default() += plays;
        }
    }

    let max_plays = play_counts.values().copied().max().unwrap_or(0);
    let max_artist = artist_counts.values().copied().max().unwrap_or(0);
    let max_tag = tag_counts.values().copied().max().unwrap_or(0);

    let mut scored: Vec<(f64, &Track)> = tracks
        .iter()
        .map(|track| {
            let play_signal = if max_plays > 0 {
                f64::from(play_counts.get(track.id.as_str()).copied().unwrap_or(0))
                    / f64::from(max_plays)
            } else {
                0.0
            };

            let artist_signal = if max_artist > 0 {
                f64::from(
                    artist_counts
                        .get(track.metadata.artist.as_str())
                        .copied()
                        .unwrap_or(0),
                ) / f64::from(max_artist)
            } else {
                0.0
            };

            let tag_signal = if !track.tags.is_empty() && max_tag > 0 {
                let affinity: u32 = track
                    .tags
                    .iter()
                    .map(|tag| tag_counts.get(tag.as_str()).copied().unwrap_or(0))
                    .sum();
                f64::from(affinity) / (track.tags.len() as f64 * f64::from(max_tag))
            } else {
                0.0
            };

            let age_ms = now_ms - track.added_at;
            let recency_signal = (1.0 - age_ms as f64 / window_ms as f64).max(0.0);

            let score = 0.4 * play_signal
                + 0.3 * artist_signal
                + 0.4 * tag_signal
                + 0.2 * recency_signal;
            (score, track)
        })
        .collect();

    // Stable descending sort: ties keep input order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|(_, track)| track.clone())
        .collect()
}
