//! Integrated loudness measurement using ffmpeg's ebur128 filter.
//!
//! This module shells out to `ffmpeg`, which is more reliable than bindings
//! and available everywhere the app runs. The filter prints integrated
//! loudness lines on stderr while decoding; the last one is the final
//! measurement.
//!
//! Measurement is best-effort: any failure (ffmpeg missing, decode error, no
//! loudness line in the output) yields [`DEFAULT_LUFS`] so an import never
//! fails on analysis.

use std::path::Path;
use std::sync::OnceLock;
use tokio::process::Command;

/// Fallback loudness when measurement fails: the common streaming target.
pub const DEFAULT_LUFS: f64 = -14.0;

/// Common installation paths for ffmpeg on Windows
#[cfg(windows)]
const FFMPEG_PATHS: &[&str] = &[
    "ffmpeg", // In PATH
    r"C:\Program Files\ffmpeg\bin\ffmpeg.exe",
    r"C:\ffmpeg\bin\ffmpeg.exe",
];

#[cfg(not(windows))]
const FFMPEG_PATHS: &[&str] = &[
    "ffmpeg", // In PATH
    "/usr/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/opt/homebrew/bin/ffmpeg",
];

/// Find the ffmpeg executable, checking common installation paths.
/// The result is cached for the process lifetime.
fn find_ffmpeg() -> Option<&'static str> {
    static FOUND: OnceLock<Option<&'static str>> = OnceLock::new();
    *FOUND.get_or_init(|| {
        let found = FFMPEG_PATHS.iter().find(|&path| {
            std::process::Command::new(path)
                .arg("-version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        });
        match found {
            Some(&path) => {
                tracing::debug!("using ffmpeg at {}", path);
                Some(path)
            }
            None => {
                tracing::warn!("ffmpeg not found; loudness defaults to {} LUFS", DEFAULT_LUFS);
                None
            }
        }
    })
}

/// Measure the integrated loudness of an audio file in LUFS.
///
/// Runs `ffmpeg -i <path> -af ebur128 -f null -` and parses the diagnostic
/// output. Returns [`DEFAULT_LUFS`] on any failure.
pub async fn measure(path: &Path) -> f64 {
    let Some(ffmpeg) = find_ffmpeg() else {
        return DEFAULT_LUFS;
    };

    let output = Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg("-nostats")
        .arg("-i")
        .arg(path)
        .args(["-af", "ebur128", "-f", "null", "-"])
        .output()
        .await;

    match output {
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            match parse_integrated_lufs(&stderr) {
                Some(lufs) => lufs,
                None => {
                    tracing::warn!(
                        "no loudness measurement in ffmpeg output for {}",
                        path.display()
                    );
                    DEFAULT_LUFS
                }
            }
        }
        Err(e) => {
            tracing::warn!("ffmpeg failed for {}: {}", path.display(), e);
            DEFAULT_LUFS
        }
    }
}

/// Extract the integrated loudness from ebur128 diagnostic output.
///
/// The filter emits running summaries like `I: -23.1 LUFS` followed by a
/// final summary block; the last match is authoritative.
fn parse_integrated_lufs(output: &str) -> Option<f64> {
    let mut last = None;
    for line in output.lines() {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix("I:") else {
            continue;
        };
        let Some(value_str) = rest.trim().strip_suffix("LUFS") else {
            continue;
        };
        if let Ok(value) = value_str.trim().parse::<f64>() {
            last = Some(value);
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_measurement() {
        let output = "[Parsed_ebur128_0 @ 0x55] Summary:\n\n  Integrated loudness:\n    I: -14.7 LUFS\n";
        assert_eq!(parse_integrated_lufs(output), Some(-14.7));
    }

    #[test]
    fn test_last_measurement_wins() {
        let output = "I: -70.0 LUFS\nsomething else\nI: -23.4 LUFS\n  I: -16.2 LUFS\n";
        assert_eq!(parse_integrated_lufs(output), Some(-16.2));
    }

    #[test]
    fn test_no_measurement_line() {
        assert_eq!(parse_integrated_lufs("decode warnings only"), None);
        assert_eq!(parse_integrated_lufs(""), None);
    }

    #[test]
    fn test_malformed_value_is_skipped() {
        let output = "I: not-a-number LUFS\nI: -12.5 LUFS\n";
        assert_eq!(parse_integrated_lufs(output), Some(-12.5));
    }

    #[tokio::test]
    async fn test_measure_unreadable_file_yields_default() {
        let lufs = measure(Path::new("/nonexistent/file.mp3")).await;
        assert_eq!(lufs, DEFAULT_LUFS);
    }
}
