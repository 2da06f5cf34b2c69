//! Path and URL utilities shared by the publisher and the manager
//!
//! Filesystem paths are normalized with `normpath` (cross-platform symlink and
//! `..` resolution) and displayed via `dunce` so Windows verbatim prefixes do
//! not leak into generated URLs.

use std::path::{Path, PathBuf};

use normpath::PathExt;

/// Convert a path to a string with forward slashes
pub fn to_forward_slashes(path: &Path) -> String {
    dunce::simplified(path).to_string_lossy().replace('\\', "/")
}

/// True if the reference is an absolute or scheme-relative URL
/// (`http://...`, `https://...`, or `//...`)
pub fn is_absolute_url(reference: &str) -> bool {
    reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("//")
}

/// Join a base URL and a relative path with exactly one separating slash
pub fn join_url(base: &str, rel: &str) -> String {
    let base = base.trim_end_matches('/');
    let rel = rel.trim_start_matches('/');
    if base.is_empty() {
        format!("/{rel}")
    } else {
        format!("{base}/{rel}")
    }
}

/// Normalize a path, resolving symlinks and `..` components
///
/// For non-existent paths the path is returned unchanged; callers that
/// require existence check it themselves.
pub fn normalize(path: &Path) -> PathBuf {
    match path.normalize() {
        Ok(norm) => norm.into_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

/// Last modification time of a file as epoch seconds
///
/// Returns `None` when the file is missing or its mtime cannot be read;
/// cache busting degrades silently in that case.
pub fn mtime_seconds(path: &Path) -> Option<u64> {
    let modified = path.metadata().and_then(|m| m.modified()).ok()?;
    modified
        .duration_since(std::time::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}
