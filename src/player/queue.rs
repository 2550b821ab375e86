//! Playback queue management.
//!
//! The queue holds a transient snapshot of tracks (it never mutates the
//! repository) plus the advance mode. Shuffle tracks a set of visited
//! indices: each pick is uniform over the unvisited indices, and the set
//! resets only once every index has been visited — a full cycle never
//! repeats a track, while repeats across cycle boundaries are allowed.

use rand::Rng;
use std::collections::HashSet;

use crate::model::Track;

/// How the queue advances when a track ends or the user skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueMode {
    /// Play in list order, wrapping to the start at the end
    #[default]
    ListOrder,
    /// Replay the current track indefinitely
    RepeatTrack,
    /// Finish the current track, then stop
    StopAfter,
    /// Uniform random order without repeats within a cycle
    Shuffle,
}

impl std::fmt::Display for QueueMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QueueMode::ListOrder => "list-order",
            QueueMode::RepeatTrack => "repeat",
            QueueMode::StopAfter => "will-stop",
            QueueMode::Shuffle => "shuffle",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for QueueMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "list-order" => Ok(QueueMode::ListOrder),
            "repeat" => Ok(QueueMode::RepeatTrack),
            "will-stop" => Ok(QueueMode::StopAfter),
            "shuffle" => Ok(QueueMode::Shuffle),
            other => Err(format!("unknown queue mode: {other}")),
        }
    }
}

/// Result of removing a track from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removed {
    /// The removed track was the one currently loaded
    Current,
    /// A different track was removed
    Other,
    /// The track was not in the queue
    NotQueued,
}

/// The playback queue with current position tracking.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    tracks: Vec<Track>,
    current: Option<usize>,
    mode: QueueMode,
    /// Indices already played in the current shuffle cycle
    visited: HashSet<usize>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    /// Switch the advance mode. Entering shuffle starts a fresh cycle seeded
    /// with the current track so it is not replayed immediately.
    pub fn set_mode(&mut self, mode: QueueMode) {
        self.mode = mode;
        if mode == QueueMode::Shuffle {
            self.reset_cycle();
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Replace the queue contents and point at `track_id` within the new
    /// list. The shuffle cycle restarts at the new current index.
    pub fn replace(&mut self, tracks: Vec<Track>, track_id: &str) {
        self.tracks = tracks;
        self.current = self.tracks.iter().position(|t| t.id == track_id);
        self.reset_cycle();
    }

    /// Pick the next index according to the mode and move there.
    ///
    /// Returns the track to load, or `None` when the queue is empty (or
    /// repeat mode has nothing loaded yet).
    pub fn advance(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }

        let next = match self.mode {
            QueueMode::RepeatTrack => self.current?,
            // An explicit skip advances in list order even in stop-after mode
            QueueMode::ListOrder | QueueMode::StopAfter => match self.current {
                Some(i) if i + 1 < self.tracks.len() => i + 1,
                Some(_) => 0, // wrap: the playlist restarts
                None => 0,
            },
            QueueMode::Shuffle => self.pick_unvisited(),
        };

        self.current = Some(next);
        if self.mode == QueueMode::Shuffle {
            self.visited.insert(next);
        }
        self.tracks.get(next)
    }

    /// Step back one position, clamped at the start (no wraparound).
    pub fn step_back(&mut self) -> Option<&Track> {
        let current = self.current?;
        self.current = Some(current.saturating_sub(1));
        self.current()
    }

    /// Splice a track out of the queue, keeping `current` pointing at the
    /// same logical track when possible. The shuffle cycle is reset — its
    /// indices no longer line up after a splice.
    pub fn remove(&mut self, track_id: &str) -> Removed {
        let Some(index) = self.tracks.iter().position(|t| t.id == track_id) else {
            return Removed::NotQueued;
        };

        let outcome = match self.current {
            Some(current) if current == index => {
                self.current = None;
                Removed::Current
            }
            Some(current) if index < current => {
                self.current = Some(current - 1);
                Removed::Other
            }
            _ => Removed::Other,
        };

        self.tracks.remove(index);
        self.visited.clear();
        if let Some(current) = self.current {
            self.visited.insert(current);
        }
        outcome
    }

    /// Uniform pick among unvisited indices, resetting the cycle first when
    /// every index has been visited.
    fn pick_unvisited(&mut self) -> usize {
        let mut candidates: Vec<usize> = (0..self.tracks.len())
            .filter(|i| !self.visited.contains(i))
            .collect();

        if candidates.is_empty() {
            self.visited.clear();
            candidates = (0..self.tracks.len()).collect();
        }

        let mut rng = rand::rng();
        candidates[rng.random_range(0..candidates.len())]
    }

    fn reset_cycle(&mut self) {
        self.visited.clear();
        if let Some(current) = self.current {
            self.visited.insert(current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackMetadata;
    use proptest::prelude::*;

    fn make_track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            file_hash: format!("hash-{id}"),
            file_name: format!("{id}.mp3"),
            metadata: TrackMetadata {
                title: id.to_string(),
                artist: "Artist".to_string(),
                duration_secs: 60.0,
                volume_lufs: -14.0,
            },
            tags: Vec::new(),
            added_at: 0,
        }
    }

    fn queue_of(n: usize) -> PlaybackQueue {
        let tracks: Vec<Track> = (0..n).map(|i| make_track(&format!("t{i}"))).collect();
        let mut queue = PlaybackQueue::new();
        queue.replace(tracks, "t0");
        queue
    }

    #[test]
    fn test_mode_names_roundtrip() {
        for mode in [
            QueueMode::ListOrder,
            QueueMode::RepeatTrack,
            QueueMode::StopAfter,
            QueueMode::Shuffle,
        ] {
            assert_eq!(mode.to_string().parse::<QueueMode>().unwrap(), mode);
        }
        assert!("random".parse::<QueueMode>().is_err());
    }

    #[test]
    fn test_replace_points_at_track() {
        let queue = queue_of(3);
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current().unwrap().id, "t0");

        let mut queue = PlaybackQueue::new();
        queue.replace(vec![make_track("a"), make_track("b")], "b");
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn test_list_order_wraps_to_start() {
        let mut queue = queue_of(3);
        assert_eq!(queue.advance().unwrap().id, "t1");
        assert_eq!(queue.advance().unwrap().id, "t2");
        // End of list: the playlist restarts rather than stopping
        assert_eq!(queue.advance().unwrap().id, "t0");
    }

    #[test]
    fn test_repeat_track_stays_put() {
        let mut queue = queue_of(3);
        queue.set_mode(QueueMode::RepeatTrack);
        assert_eq!(queue.advance().unwrap().id, "t0");
        assert_eq!(queue.advance().unwrap().id, "t0");
    }

    #[test]
    fn test_advance_on_empty_queue_is_noop() {
        let mut queue = PlaybackQueue::new();
        assert!(queue.is_empty());
        assert!(queue.advance().is_none());
        queue.set_mode(QueueMode::Shuffle);
        assert!(queue.advance().is_none());
    }

    #[test]
    fn test_step_back_clamps_at_start() {
        let mut queue = queue_of(3);
        queue.advance();
        queue.advance();
        assert_eq!(queue.current_index(), Some(2));

        assert_eq!(queue.step_back().unwrap().id, "t1");
        assert_eq!(queue.step_back().unwrap().id, "t0");
        // Clamped: stays at the first track
        assert_eq!(queue.step_back().unwrap().id, "t0");
    }

    #[test]
    fn test_shuffle_visits_every_track_once_per_cycle() {
        let mut queue = queue_of(8);
        queue.set_mode(QueueMode::Shuffle);

        // t0 is the seed; the next 7 advances must cover the remaining 7
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert("t0".to_string());
        for _ in 0..7 {
            let id = queue.advance().unwrap().id.clone();
            assert!(seen.insert(id), "track repeated within a shuffle cycle");
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_shuffle_cycle_resets_after_exhaustion() {
        let mut queue = queue_of(3);
        queue.set_mode(QueueMode::Shuffle);

        for _ in 0..2 {
            queue.advance();
        }
        // All three visited; the next advance starts a fresh cycle
        assert!(queue.advance().is_some());
    }

    #[test]
    fn test_remove_current_track() {
        let mut queue = queue_of(3);
        assert_eq!(queue.remove("t0"), Removed::Current);
        assert_eq!(queue.current_index(), None);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove_before_current_shifts_index() {
        let mut queue = queue_of(3);
        queue.advance(); // now at t1
        assert_eq!(queue.remove("t0"), Removed::Other);
        // Still pointing at the same logical track
        assert_eq!(queue.current().unwrap().id, "t1");
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn test_remove_after_current_keeps_index() {
        let mut queue = queue_of(3);
        queue.advance(); // now at t1
        assert_eq!(queue.remove("t2"), Removed::Other);
        assert_eq!(queue.current().unwrap().id, "t1");
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn test_remove_unqueued_track() {
        let mut queue = queue_of(2);
        assert_eq!(queue.remove("nope"), Removed::NotQueued);
        assert_eq!(queue.len(), 2);
    }

    proptest! {
        /// N consecutive advances in shuffle mode visit each index exactly
        /// once (the seed counts as visited) before any index repeats.
        #[test]
        fn prop_shuffle_cycle_has_no_repeats(n in 1usize..24) {
            let mut queue = queue_of(n);
            queue.set_mode(QueueMode::Shuffle);

            let mut seen = HashSet::new();
            seen.insert(0usize); // the seeded current index
            for _ in 0..n.saturating_sub(1) {
                queue.advance();
                let index = queue.current_index().unwrap();
                prop_assert!(seen.insert(index), "index {} repeated", index);
            }
            prop_assert_eq!(seen.len(), n);
        }
    }
}
