//! Audio file metadata reading and writing.
//!
//! Uses the lofty crate for format-independent tag access. Reading is
//! best-effort: the importer substitutes defaults (file stem, "Unknown
//! Artist", zero duration) when a file cannot be probed, so a broken tag
//! block never blocks an import. Writing is targeted — only the title and
//! artist fields are ever rewritten, after a library-side edit or rename.

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagExt};
use std::path::Path;

use crate::error::{Error, Result};

/// Fields read from a file's embedded tags.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration_secs: f64,
}

/// Read title, artist and duration from a file's embedded tags.
///
/// # Errors
///
/// Returns a `Decode` error when the file cannot be probed; callers that
/// import apply defaults instead of propagating.
pub fn read(path: &Path) -> Result<EmbeddedMetadata> {
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::decode(path, format!("failed to open for probing: {e}")))?
        .read()
        .map_err(|e| Error::decode(path, format!("failed to read metadata: {e}")))?;

    // Primary tag, or the first available one
    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

    let title = tag.and_then(|t| t.title().map(|s| s.to_string()));
    let artist = tag.and_then(|t| t.artist().map(|s| s.to_string()));
    let duration_secs = tagged_file.properties().duration().as_secs_f64();

    Ok(EmbeddedMetadata {
        title,
        artist,
        duration_secs,
    })
}

/// Rewrite the title and/or artist fields of a file's embedded tags.
///
/// Fields passed as `None` are left untouched. Creates a tag of the format's
/// primary type when the file has none.
pub fn write(path: &Path, title: Option<&str>, artist: Option<&str>) -> Result<()> {
    if title.is_none() && artist.is_none() {
        return Ok(());
    }

    let mut tagged_file = Probe::open(path)
        .map_err(|e| Error::decode(path, format!("failed to open for writing: {e}")))?
        .read()
        .map_err(|e| Error::decode(path, format!("failed to read for tag writing: {e}")))?;

    let tag_type = tagged_file.primary_tag_type();
    let tag = match tagged_file.tag_mut(tag_type) {
        Some(tag) => tag,
        None => {
            tagged_file.insert_tag(Tag::new(tag_type));
            tagged_file
                .tag_mut(tag_type)
                .expect("tag inserted immediately above")
        }
    };

    if let Some(title) = title {
        tag.set_title(title.to_string());
    }
    if let Some(artist) = artist {
        tag.set_artist(artist.to_string());
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| Error::decode(path, format!("failed to write tags: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_non_audio_file_returns_error() {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        writeln!(file, "this is just text, not music").unwrap();

        assert!(read(file.path()).is_err());
    }

    #[test]
    fn test_read_non_existent_file_returns_error() {
        assert!(read(Path::new("non_existent_file.mp3")).is_err());
    }

    #[test]
    fn test_write_nothing_is_a_no_op() {
        // No fields requested: must succeed without even opening the file
        assert!(write(Path::new("non_existent_file.mp3"), None, None).is_ok());
    }

    #[test]
    fn test_write_to_non_audio_file_returns_error() {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        writeln!(file, "not an audio file").unwrap();

        assert!(write(file.path(), Some("Title"), None).is_err());
    }
}
