//! HTTP server for the playback front-end.
//!
//! Exposes the library and the playback session over a small axum router:
//!
//! - `GET /health` — module liveness
//! - `GET /tracks` — current live listing as JSON
//! - `GET /media/{id}` — audio bytes with HTTP range semantics
//! - `GET /playback` + `POST /playback/...` — session control
//!
//! The media endpoint is the transport's delivery contract: the player
//! seeks by requesting byte ranges instead of re-reading the whole file.
//! A request without a `Range` header gets 200 with the full body and an
//! `Accept-Ranges: bytes` advertisement; a valid range gets 206 with the
//! exact slice and a `Content-Range` header; an unsatisfiable range gets
//! 416.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::library::TrackRepository;
use crate::model::Track;
use crate::player::{ClockTransport, PlaybackSession, PlaybackState, QueueMode};

/// The playback session as shared by the server handlers.
pub type SharedSession = Arc<Mutex<PlaybackSession<ClockTransport>>>;

/// Shared application context passed to all handlers.
#[derive(Clone)]
pub struct AppContext {
    pub repo: Arc<TrackRepository>,
    pub session: SharedSession,
}

/// Build the router.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tracks", get(tracks))
        .route("/media/{id}", get(media))
        .route("/playback", get(playback_status))
        .route("/playback/play/{id}", post(playback_play))
        .route("/playback/pause", post(playback_pause))
        .route("/playback/resume", post(playback_resume))
        .route("/playback/stop", post(playback_stop))
        .route("/playback/next", post(playback_next))
        .route("/playback/previous", post(playback_previous))
        .route("/playback/mode/{mode}", post(playback_mode))
        .route("/playback/volume/{volume}", post(playback_volume))
        .route("/playback/normalization/{enabled}", post(playback_normalization))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Bind and serve until the process is stopped.
pub async fn run(ctx: AppContext, port: u16) -> Result<()> {
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("media server listening on http://{}", addr);
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct TrackResponse {
    id: String,
    title: String,
    artist: String,
    duration_secs: f64,
    tags: Vec<String>,
    file_name: String,
    added_at: i64,
}

#[derive(Debug, Serialize)]
struct PlaybackResponse {
    state: String,
    track_id: Option<String>,
    title: Option<String>,
    position_secs: f64,
    mode: String,
    gain: f32,
}

fn playback_response(session: &PlaybackSession<ClockTransport>) -> Json<PlaybackResponse> {
    let state = match session.state() {
        PlaybackState::Idle => "idle",
        PlaybackState::Loading => "loading",
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
        PlaybackState::Error => "error",
    };
    Json(PlaybackResponse {
        state: state.to_string(),
        track_id: session.current_track().map(|t| t.id.clone()),
        title: session.current_track().map(|t| t.metadata.title.clone()),
        position_secs: session.position_secs(),
        mode: session.mode().to_string(),
        gain: session.current_gain(),
    })
}

// ============================================================================
// Library Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "music_keeper".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn tracks(State(ctx): State<AppContext>) -> Response {
    match ctx.repo.list_all().await {
        Ok(listing) => {
            let payload: Vec<TrackResponse> = listing
                .into_iter()
                .map(|t| TrackResponse {
                    id: t.track.id,
                    title: t.track.metadata.title,
                    artist: t.track.metadata.artist,
                    duration_secs: t.track.metadata.duration_secs,
                    tags: t.track.tags,
                    file_name: t.track.file_name,
                    added_at: t.track.added_at,
                })
                .collect();
            Json(payload).into_response()
        }
        Err(e) => {
            tracing::error!("track listing failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve a track's audio bytes, honoring an optional `Range` header.
async fn media(
    State(ctx): State<AppContext>,
    Path(track_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Ok(track) = ctx.repo.get(&track_id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let path = ctx.repo.audio_dir().join(&track.file_name);
    let Ok(data) = tokio::fs::read(&path).await else {
        tracing::warn!("media source missing: {}", path.display());
        return StatusCode::NOT_FOUND.into_response();
    };

    let total = data.len() as u64;
    let mime = mime_for_extension(&track.file_name);

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    match range_header.map(|r| parse_range(r, total)) {
        None => full_response(data, mime),
        Some(RangeRequest::Satisfiable { start, end }) => {
            let chunk = data[start as usize..=end as usize].to_vec();
            partial_response(chunk, mime, start, end, total)
        }
        Some(RangeRequest::Unsatisfiable) => Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{total}"))
            .body(Body::empty())
            .expect("static response"),
        // A malformed Range header degrades to a full response
        Some(RangeRequest::Malformed) => full_response(data, mime),
    }
}

fn full_response(data: Vec<u8>, mime: &'static str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .expect("static response")
}

fn partial_response(
    chunk: Vec<u8>,
    mime: &'static str,
    start: u64,
    end: u64,
    total: u64,
) -> Response {
    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, mime)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, chunk.len())
        .header(header::CONTENT_RANGE, format!("bytes {start}-{end}/{total}"))
        .body(Body::from(chunk))
        .expect("static response")
}

// ============================================================================
// Playback Handlers
// ============================================================================

async fn playback_status(State(ctx): State<AppContext>) -> Response {
    let session = ctx.session.lock().await;
    // The front-end polls this on its display cadence; publish the tick to
    // any other subscriber while we are at it
    session.emit_position();
    playback_response(&session).into_response()
}

/// Start playing a track with the full live listing as the queue.
async fn playback_play(State(ctx): State<AppContext>, Path(track_id): Path<String>) -> Response {
    let Ok(track) = ctx.repo.get(&track_id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Ok(listing) = ctx.repo.list_all().await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let list: Vec<Track> = listing.into_iter().map(|t| t.track).collect();

    let mut session = ctx.session.lock().await;
    session.play(track, Some(list)).await;
    playback_response(&session).into_response()
}

async fn playback_pause(State(ctx): State<AppContext>) -> Response {
    let mut session = ctx.session.lock().await;
    session.pause();
    playback_response(&session).into_response()
}

async fn playback_resume(State(ctx): State<AppContext>) -> Response {
    let mut session = ctx.session.lock().await;
    session.resume();
    playback_response(&session).into_response()
}

async fn playback_stop(State(ctx): State<AppContext>) -> Response {
    let mut session = ctx.session.lock().await;
    session.stop();
    playback_response(&session).into_response()
}

async fn playback_next(State(ctx): State<AppContext>) -> Response {
    let mut session = ctx.session.lock().await;
    session.next().await;
    playback_response(&session).into_response()
}

async fn playback_previous(State(ctx): State<AppContext>) -> Response {
    let mut session = ctx.session.lock().await;
    session.prev().await;
    playback_response(&session).into_response()
}

async fn playback_mode(State(ctx): State<AppContext>, Path(mode): Path<String>) -> Response {
    let Ok(mode) = mode.parse::<QueueMode>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let mut session = ctx.session.lock().await;
    session.set_mode(mode);
    playback_response(&session).into_response()
}

/// Master volume slider, 0-100.
async fn playback_volume(State(ctx): State<AppContext>, Path(volume): Path<String>) -> Response {
    let Ok(volume) = volume.parse::<u8>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if volume > 100 {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let mut session = ctx.session.lock().await;
    session.set_master_volume(volume);
    playback_response(&session).into_response()
}

async fn playback_normalization(
    State(ctx): State<AppContext>,
    Path(enabled): Path<String>,
) -> Response {
    let enabled = match enabled.as_str() {
        "on" => true,
        "off" => false,
        _ => return StatusCode::BAD_REQUEST.into_response(),
    };
    let mut session = ctx.session.lock().await;
    session.set_loudness_normalization(enabled);
    playback_response(&session).into_response()
}

// ============================================================================
// Range parsing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeRequest {
    Satisfiable { start: u64, end: u64 },
    Unsatisfiable,
    Malformed,
}

/// Parse a `Range` header value against a resource of `total` bytes.
///
/// Supports the single-range forms `bytes=a-b`, `bytes=a-` and `bytes=-n`.
/// An end past the resource is clamped; a start past the resource is
/// unsatisfiable.
fn parse_range(value: &str, total: u64) -> RangeRequest {
    let Some(spec) = value.strip_prefix("bytes=") else {
        return RangeRequest::Malformed;
    };
    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeRequest::Malformed;
    };

    if total == 0 {
        return RangeRequest::Unsatisfiable;
    }

    if start_str.is_empty() {
        // Suffix form: last n bytes
        let Ok(suffix) = end_str.trim().parse::<u64>() else {
            return RangeRequest::Malformed;
        };
        if suffix == 0 {
            return RangeRequest::Unsatisfiable;
        }
        let start = total.saturating_sub(suffix);
        return RangeRequest::Satisfiable {
            start,
            end: total - 1,
        };
    }

    let Ok(start) = start_str.trim().parse::<u64>() else {
        return RangeRequest::Malformed;
    };
    if start >= total {
        return RangeRequest::Unsatisfiable;
    }

    let end = if end_str.trim().is_empty() {
        total - 1
    } else {
        match end_str.trim().parse::<u64>() {
            Ok(end) => end.min(total - 1),
            Err(_) => return RangeRequest::Malformed,
        }
    };

    if end < start {
        return RangeRequest::Unsatisfiable;
    }

    RangeRequest::Satisfiable { start, end }
}

/// MIME type from a file extension, defaulting to an opaque binary type.
fn mime_for_extension(file_name: &str) -> &'static str {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}
