//! Serve command: run the media server with a live playback session.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::App;
use crate::events::Event;
use crate::player::{ClockTransport, PlaybackSession};
use crate::server::{self, AppContext};

/// Run the media server until interrupted.
///
/// The playback session is owned here, the composition root, and handed to
/// the server by reference; repository deletions reach it through the event
/// bus so a deleted track can never keep playing from a stale reference.
pub async fn cmd_serve(app: &App, port: Option<u16>) -> anyhow::Result<()> {
    let session = PlaybackSession::new(
        ClockTransport::new(),
        app.events.clone(),
        app.repo.audio_dir().to_path_buf(),
        &app.config.playback,
    )
    .with_history(app.history.clone());
    let session = Arc::new(Mutex::new(session));

    // Queue invalidation on delete
    let mut events = app.events.subscribe();
    let queue_session = session.clone();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Event::TrackDeleted { track_id } = event {
                queue_session.lock().await.remove_track(&track_id);
            }
        }
    });

    let port = port.unwrap_or(app.config.server.port);
    let ctx = AppContext {
        repo: app.repo.clone(),
        session,
    };

    tokio::select! {
        result = server::run(ctx, port) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }
    Ok(())
}
