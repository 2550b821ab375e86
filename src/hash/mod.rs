//! Content hash computation for duplicate detection.
//!
//! A track's identity is a SHA-256 digest over its audio payload, not the
//! whole file: when the file starts with an ID3v2 container the tag block is
//! skipped before hashing, so re-tagging a file does not change its identity.
//! Any error while parsing the tag header falls back silently to hashing the
//! entire file — the dedup is best-effort, never a reason to fail an import.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// ID3v2 header: "ID3", version (2 bytes), flags (1 byte), synchsafe size (4 bytes).
const ID3V2_HEADER_LEN: u64 = 10;
/// Bit 4 of the flags byte marks the presence of a 10-byte footer after the tag.
const ID3V2_FOOTER_FLAG: u8 = 0x10;

/// Compute the content hash of an audio file.
///
/// Returns the SHA-256 digest of the payload bytes as a lowercase hex string
/// (64 characters). See [`audio_payload_offset`] for which bytes count as
/// payload.
///
/// # Errors
///
/// Returns an IO error only if the file itself cannot be read; tag-parsing
/// problems degrade to whole-file hashing instead of erroring.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;

    let offset = audio_payload_offset(&mut file).unwrap_or(0);
    file.seek(SeekFrom::Start(offset))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Determine where the audio payload starts.
///
/// Returns `Some(offset)` past a leading ID3v2 container, or `None` when no
/// recognizable container is present (or its header is malformed), meaning
/// the whole file is the payload.
fn audio_payload_offset(file: &mut File) -> Option<u64> {
    let mut header = [0u8; ID3V2_HEADER_LEN as usize];
    file.read_exact(&mut header).ok()?;

    if &header[0..3] != b"ID3" {
        return None;
    }

    let tag_len = synchsafe_u32(&header[6..10])?;
    let mut offset = ID3V2_HEADER_LEN + u64::from(tag_len);
    if header[5] & ID3V2_FOOTER_FLAG != 0 {
        offset += ID3V2_HEADER_LEN;
    }

    // A declared size past EOF means the header is lying; hash everything.
    let file_len = file.metadata().ok()?.len();
    if offset >= file_len {
        return None;
    }

    Some(offset)
}

/// Decode a 4-byte synchsafe integer (7 bits per byte, high bit clear).
///
/// Returns `None` if any byte has the high bit set, which marks a malformed
/// size field.
fn synchsafe_u32(bytes: &[u8]) -> Option<u32> {
    let mut value: u32 = 0;
    for &b in bytes.iter().take(4) {
        if b & 0x80 != 0 {
            return None;
        }
        value = (value << 7) | u32::from(b);
    }
    Some(value)
}
