//! Transport seam between the playback session and the audio front-end.
//!
//! The session state machine only needs a handful of transport capabilities:
//! open a stream, pause/resume it, report the elapsed position, release the
//! resource. Putting them behind a trait keeps the state machine
//! unit-testable; the shipped [`ClockTransport`] tracks position against the
//! wall clock while the actual byte delivery happens over the media
//! endpoint (see [`crate::server`]).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Capabilities the playback session requires from a transport.
pub trait Transport {
    /// Open a stream for the file and start delivering from position 0.
    ///
    /// # Errors
    ///
    /// Returns a `Decode` error when the stream cannot be opened; the
    /// session maps this to its `Error` state with a recoverable prompt.
    fn start(&mut self, path: &Path) -> Result<()>;

    /// Halt delivery, keeping the stream and position.
    fn pause(&mut self);

    /// Resume delivery of a paused stream.
    fn resume(&mut self) -> Result<()>;

    /// Release the stream. Position resets; there is nothing left to poll.
    fn stop(&mut self);

    /// Elapsed position in the current track.
    fn position(&self) -> Duration;

    /// Seek back to position 0 without reopening the stream.
    fn restart(&mut self);
}

/// Wall-clock transport: tracks position as real time elapsed while playing.
///
/// The clock pauses on `pause` and is dropped on `stop`, so no timer or
/// callback outlives the stream — position polling after an exit path reads
/// zero.
#[derive(Debug, Default)]
pub struct ClockTransport {
    source: Option<PathBuf>,
    /// Set while delivering; None while paused or stopped
    playing_since: Option<Instant>,
    /// Position accumulated across pause/resume boundaries
    accumulated: Duration,
}

impl ClockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The file currently loaded, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl Transport for ClockTransport {
    fn start(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(Error::decode(path, "audio file is missing"));
        }
        self.source = Some(path.to_path_buf());
        self.accumulated = Duration::ZERO;
        self.playing_since = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(since) = self.playing_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    fn resume(&mut self) -> Result<()> {
        let Some(path) = &self.source else {
            return Err(Error::decode(PathBuf::new(), "no stream to resume"));
        };
        if !path.is_file() {
            return Err(Error::decode(path.clone(), "audio file is missing"));
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.source = None;
        self.playing_since = None;
        self.accumulated = Duration::ZERO;
    }

    fn position(&self) -> Duration {
        match self.playing_since {
            Some(since) => self.accumulated + since.elapsed(),
            None => self.accumulated,
        }
    }

    fn restart(&mut self) {
        self.accumulated = Duration::ZERO;
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_audio() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"bytes").unwrap();
        file
    }

    #[test]
    fn test_start_missing_file_errors() {
        let mut transport = ClockTransport::new();
        assert!(transport.start(Path::new("/nonexistent.mp3")).is_err());
    }

    #[test]
    fn test_position_frozen_while_paused() {
        let file = temp_audio();
        let mut transport = ClockTransport::new();
        transport.start(file.path()).unwrap();

        transport.pause();
        let frozen = transport.position();
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(transport.position(), frozen);
    }

    #[test]
    fn test_position_advances_while_playing() {
        let file = temp_audio();
        let mut transport = ClockTransport::new();
        transport.start(file.path()).unwrap();

        std::thread::sleep(Duration::from_millis(15));
        assert!(transport.position() >= Duration::from_millis(10));
    }

    #[test]
    fn test_stop_releases_everything() {
        let file = temp_audio();
        let mut transport = ClockTransport::new();
        transport.start(file.path()).unwrap();

        transport.stop();
        assert_eq!(transport.position(), Duration::ZERO);
        assert!(transport.source().is_none());
        // Resuming a released stream fails
        assert!(transport.resume().is_err());
    }

    #[test]
    fn test_restart_rewinds() {
        let file = temp_audio();
        let mut transport = ClockTransport::new();
        transport.start(file.path()).unwrap();
        transport.pause();

        std::thread::sleep(Duration::from_millis(5));
        transport.restart();
        assert_eq!(transport.position(), Duration::ZERO);
    }
}
