//! BLAKE3 fingerprint helpers for published asset directories
//!
//! The default publish fingerprint is derived from the source path and its
//! modification time, not its contents. Two different contents written within
//! the same mtime second therefore collide; this mirrors the behavior the
//! pipeline has always had. Callers that want a strict key can install
//! [`content_fingerprint`] as the publisher's hash callback.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use blake3::Hasher;
use walkdir::WalkDir;

use crate::error::{AssetError, Result};
use crate::path_utils;

/// Number of hex characters kept from the full BLAKE3 digest
const FINGERPRINT_LEN: usize = 16;

/// Hex fingerprint of arbitrary input bytes, truncated for use as a
/// directory name
pub fn fingerprint(input: &[u8]) -> String {
    let mut hex = blake3::hash(input).to_hex().to_string();
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// Default publish fingerprint for a source path
///
/// Input is `<dir><mtime>|<link>` where `dir` is the path itself for a
/// directory source and the containing directory for a file source. Stable
/// while the source mtime is unchanged; changes when the source is touched
/// or when the link mode flips.
pub fn source_fingerprint(source: &Path, link: bool) -> String {
    let dir = if source.is_file() {
        source.parent().unwrap_or(source)
    } else {
        source
    };
    let mtime = path_utils::mtime_seconds(source).unwrap_or(0);
    let input = format!("{}{}|{}", path_utils::to_forward_slashes(dir), mtime, link);
    fingerprint(input.as_bytes())
}

/// Content-based fingerprint of a file or directory
///
/// Hashes file contents (recursively for directories, sorted by relative
/// path for determinism). Suitable as a publisher hash callback when mtime
/// granularity is not trusted.
pub fn content_fingerprint(source: &Path) -> Result<String> {
    let mut hasher = Hasher::new();

    if source.is_file() {
        hash_file_into(&mut hasher, source)?;
    } else {
        let mut files: Vec<_> = WalkDir::new(source)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .collect();
        files.sort_by_key(|e| e.path().to_path_buf());

        for entry in files {
            let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
            hasher.update(path_utils::to_forward_slashes(rel).as_bytes());
            hasher.update(b"\0");
            hash_file_into(&mut hasher, entry.path())?;
            hasher.update(b"\0");
        }
    }

    let mut hex = hasher.finalize().to_hex().to_string();
    hex.truncate(FINGERPRINT_LEN);
    Ok(hex)
}

fn hash_file_into(hasher: &mut Hasher, path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|e| AssetError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| AssetError::FileReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(())
}
