//! Playback session: the state machine driving "what plays next".
//!
//! A [`PlaybackSession`] is owned by the composition root and passed to
//! whatever needs transport control — there is no global player object.
//! All transitions are triggered by discrete external events (user action,
//! stream-ended callback) and processed to completion before the next one;
//! the session never runs its own timers.
//!
//! ```text
//!           play()                ok
//!   Idle ───────────▶ Loading ─────────▶ Playing ◀──────┐
//!     ▲                  │                 │  ▲          │ resume()
//!     │                  │ stream error    │  └──────────┤
//!     │ stop()           ▼                 ▼ pause()     │
//!     └───────────────  Error            Paused ─────────┘
//! ```

mod queue;
mod transport;

pub use queue::{PlaybackQueue, QueueMode, Removed};
pub use transport::{ClockTransport, Transport};

use std::path::PathBuf;
use std::time::Duration;

use crate::config::PlaybackConfig;
use crate::events::{Event, EventBus};
use crate::history::HistoryLog;
use crate::model::Track;

/// Position threshold under which `prev()` steps back instead of rewinding.
const PREV_REWIND_THRESHOLD: Duration = Duration::from_secs(1);

/// Current playback status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

/// The playback session state machine.
pub struct PlaybackSession<T: Transport> {
    queue: PlaybackQueue,
    transport: T,
    state: PlaybackState,
    /// The track the transport currently has open (independent of the queue:
    /// a track can play without being queued)
    current_track: Option<Track>,
    events: EventBus,
    audio_dir: PathBuf,
    /// Play events are recorded here when wired; failures only warn
    history: Option<HistoryLog>,
    loudness_normalization: bool,
    master_volume: u8,
    target_lufs: f64,
}

impl<T: Transport> PlaybackSession<T> {
    pub fn new(transport: T, events: EventBus, audio_dir: PathBuf, config: &PlaybackConfig) -> Self {
        Self {
            queue: PlaybackQueue::new(),
            transport,
            state: PlaybackState::Idle,
            current_track: None,
            events,
            audio_dir,
            history: None,
            loudness_normalization: config.loudness_normalization,
            master_volume: config.master_volume,
            target_lufs: config.target_lufs,
        }
    }

    /// Wire the history log so successful stream starts are recorded.
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn mode(&self) -> QueueMode {
        self.queue.mode()
    }

    pub fn set_mode(&mut self, mode: QueueMode) {
        self.queue.set_mode(mode);
        self.events.emit(Event::QueueChanged);
    }

    /// Elapsed position in the current track, seconds.
    pub fn position_secs(&self) -> f64 {
        self.transport.position().as_secs_f64()
    }

    /// Publish a position tick. Called by the shell on its own display
    /// cadence; the session keeps no timer of its own.
    pub fn emit_position(&self) {
        if self.state == PlaybackState::Playing {
            self.events.emit(Event::PositionTick {
                position_secs: self.position_secs(),
            });
        }
    }

    /// Start playing `track`. With `Some(list)` the queue is replaced and
    /// repositioned onto the track; with `None` the existing queue and index
    /// are preserved (in-place replay).
    pub async fn play(&mut self, track: Track, list: Option<Vec<Track>>) {
        if let Some(list) = list {
            self.queue.replace(list, &track.id);
            self.events.emit(Event::QueueChanged);
        }
        self.load_and_start(track).await;
    }

    /// `Playing` → `Paused`; no-op in any other state.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.transport.pause();
            self.set_state(PlaybackState::Paused);
        }
    }

    /// `Paused` → `Playing`, re-attempting stream delivery.
    pub fn resume(&mut self) {
        if self.state != PlaybackState::Paused {
            return;
        }
        match self.transport.resume() {
            Ok(()) => self.set_state(PlaybackState::Playing),
            Err(e) => self.enter_error(e.to_string()),
        }
    }

    /// Any state → `Idle`; releases the audio resource.
    pub fn stop(&mut self) {
        self.transport.stop();
        self.current_track = None;
        self.set_state(PlaybackState::Idle);
    }

    /// Stream-ended callback from the transport (not user-initiated).
    pub async fn on_track_ended(&mut self) {
        match self.queue.mode() {
            QueueMode::RepeatTrack => {
                if let Some(track) = self.current_track.clone() {
                    self.load_and_start(track).await;
                }
            }
            QueueMode::StopAfter => {
                self.transport.stop();
                self.current_track = None;
                self.set_state(PlaybackState::Idle);
            }
            QueueMode::ListOrder | QueueMode::Shuffle => self.next().await,
        }
    }

    /// Advance to the next track per the queue mode. No-op on an empty
    /// queue.
    pub async fn next(&mut self) {
        if let Some(track) = self.queue.advance().cloned() {
            self.events.emit(Event::QueueChanged);
            self.load_and_start(track).await;
        }
    }

    /// Restart the current track when more than a second has elapsed;
    /// otherwise step back one queue position (clamped at the start).
    pub async fn prev(&mut self) {
        if self.transport.position() > PREV_REWIND_THRESHOLD {
            self.transport.restart();
            self.events.emit(Event::PositionTick { position_secs: 0.0 });
            return;
        }

        if let Some(track) = self.queue.step_back().cloned() {
            self.events.emit(Event::QueueChanged);
            self.load_and_start(track).await;
        }
    }

    /// React to a repository delete: stop if the track is loaded, keep the
    /// queue index pointing at the same logical track, splice it out.
    pub fn remove_track(&mut self, track_id: &str) {
        let loaded = self
            .current_track
            .as_ref()
            .is_some_and(|t| t.id == track_id);

        let removed = self.queue.remove(track_id);

        if loaded {
            self.transport.stop();
            self.current_track = None;
            self.set_state(PlaybackState::Idle);
        }
        if removed != Removed::NotQueued {
            self.events.emit(Event::QueueChanged);
        }
    }

    /// Gain for the current track: loudness normalization relative to the
    /// target, scaled by the master volume, clamped to the valid output
    /// range.
    pub fn current_gain(&self) -> f32 {
        let track_lufs = self
            .current_track
            .as_ref()
            .map(|t| t.metadata.volume_lufs)
            .unwrap_or(self.target_lufs);
        playback_gain(
            track_lufs,
            self.target_lufs,
            self.master_volume,
            self.loudness_normalization,
        )
    }

    /// Master volume slider position (0-100).
    pub fn set_master_volume(&mut self, volume: u8) {
        self.master_volume = volume.min(100);
    }

    pub fn set_loudness_normalization(&mut self, enabled: bool) {
        self.loudness_normalization = enabled;
    }

    async fn load_and_start(&mut self, track: Track) {
        self.set_state(PlaybackState::Loading);

        let path = self.audio_dir.join(&track.file_name);
        match self.transport.start(&path) {
            Ok(()) => {
                self.current_track = Some(track.clone());
                self.set_state(PlaybackState::Playing);
                if let Some(history) = &self.history {
                    if let Err(e) = history.add(&track.id).await {
                        tracing::warn!("failed to record play of {}: {}", track.id, e);
                    }
                }
            }
            Err(e) => {
                tracing::error!("stream start failed for {}: {}", path.display(), e);
                self.enter_error(e.to_string());
            }
        }
    }

    fn enter_error(&mut self, message: String) {
        self.set_state(PlaybackState::Error);
        self.events.emit(Event::PlayerError {
            message,
            recoverable: true,
        });
    }

    fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        self.events.emit(Event::PlaybackChanged { state });
    }
}

/// Compute the playback gain for a track.
///
/// With normalization on, the track's stored loudness is pulled to the
/// target (`gain = 10^(ΔLUFS/20)`); the master volume slider (0-100)
/// multiplies in, and the result is clamped to [0, 1].
pub fn playback_gain(
    track_lufs: f64,
    target_lufs: f64,
    master_volume: u8,
    normalization: bool,
) -> f32 {
    let normalize = if normalization {
        let delta_db = target_lufs - track_lufs;
        10f64.powf(delta_db / 20.0)
    } else {
        1.0
    };
    let master = f64::from(master_volume.min(100)) / 100.0;
    (normalize * master).clamp(0.0, 1.0) as f32
}
