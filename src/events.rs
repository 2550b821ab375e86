//! Typed change events published by the core.
//!
//! The core never renders UI; instead every mutation and playback transition
//! is announced on a broadcast bus and each presentation surface subscribes
//! independently. Subscribers that fall behind lose the oldest events
//! (tokio broadcast semantics), which is acceptable for refresh-style
//! consumers — they re-read the repository on the next event anyway.

use tokio::sync::broadcast;

use crate::player::PlaybackState;

/// A discrete notification for the shell.
#[derive(Debug, Clone)]
pub enum Event {
    TrackAdded { track_id: String },
    TrackUpdated { track_id: String },
    TrackDeleted { track_id: String },
    PlaylistChanged { playlist_id: String },
    /// The queue contents or current position changed
    QueueChanged,
    PlaybackChanged { state: PlaybackState },
    PositionTick { position_secs: f64 },
    /// A stream failure the user may retry (reload prompt)
    PlayerError { message: String, recoverable: bool },
}

/// One-to-many event broadcasting for core change notifications.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers. Emitting with no subscribers is not
    /// an error — the CLI runs most operations without any.
    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
