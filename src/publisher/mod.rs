//! Publication of bundle source trees into the public webroot
//!
//! A bundle's `source_path` lives outside the webroot; publishing copies (or
//! symlinks) it into `<base_path>/<fingerprint>` and reports the matching
//! public URL. The fingerprint doubles as the cache-busting token: it is
//! stable while the source mtime is unchanged and moves when the source is
//! touched.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};

use crate::aliases::Aliases;
use crate::bundle::{AssetBundle, PublishOptions};
use crate::error::{AssetError, Result};
use crate::hash;
use crate::path_utils;

/// Custom fingerprint function; receives the resolved source path
pub type HashCallback = Box<dyn Fn(&Path) -> String + Send + Sync>;

/// Publishes bundle sources by copy or symlink, with a process-lifetime
/// result cache
pub struct AssetPublisher {
    aliases: Aliases,
    base_path: String,
    base_url: String,
    link_assets: bool,
    force_copy: bool,
    hash_callback: Option<HashCallback>,
    published: HashMap<(String, bool), (PathBuf, String)>,
}

impl AssetPublisher {
    /// Create a publisher writing under `base_path` and serving from
    /// `base_url` (both alias-form)
    pub fn new(
        aliases: Aliases,
        base_path: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            aliases,
            base_path: base_path.into(),
            base_url: base_url.into(),
            link_assets: false,
            force_copy: false,
            hash_callback: None,
            published: HashMap::new(),
        }
    }

    /// Publish by symlink instead of copying
    pub fn set_link_assets(&mut self, link: bool) {
        self.link_assets = link;
    }

    /// Whether symlink publication is enabled
    pub fn link_assets(&self) -> bool {
        self.link_assets
    }

    /// Copy again even when the destination already exists (global default,
    /// OR-ed with each bundle's own flag)
    pub fn set_force_copy(&mut self, force: bool) {
        self.force_copy = force;
    }

    /// Replace the default mtime-based fingerprint with a custom function,
    /// e.g. [`crate::hash::content_fingerprint`]
    pub fn set_hash_callback(&mut self, callback: HashCallback) {
        self.hash_callback = Some(callback);
    }

    /// Publish a bundle's source tree
    ///
    /// Returns the destination directory and its public URL. Repeated calls
    /// for the same resolved source and link mode are idempotent no-ops
    /// served from the cache.
    ///
    /// # Errors
    ///
    /// `InvalidSourcePath` when the source does not resolve to an existing
    /// path, `PublishFailed` on any I/O failure.
    pub fn publish(&mut self, bundle: &AssetBundle) -> Result<(PathBuf, String)> {
        let source_alias = bundle.source_path.as_deref().unwrap_or("");
        let resolved = self.aliases.get(source_alias)?;
        let source = PathBuf::from(&resolved);
        if source_alias.is_empty() || !source.exists() {
            return Err(AssetError::InvalidSourcePath { path: resolved });
        }
        let source = path_utils::normalize(&source);

        let cache_key = (path_utils::to_forward_slashes(&source), self.link_assets);
        if let Some(cached) = self.published.get(&cache_key) {
            debug!(source = %source.display(), "already published, using cached location");
            return Ok(cached.clone());
        }

        let fingerprint = match &self.hash_callback {
            Some(callback) => callback(&source),
            None => hash::source_fingerprint(&source, self.link_assets),
        };

        let base_path = PathBuf::from(self.aliases.get(&self.base_path)?);
        let base_url = self.aliases.get(&self.base_url)?;
        let destination = base_path.join(&fingerprint);
        let url = path_utils::join_url(&base_url, &fingerprint);

        if self.link_assets {
            link_source(&source, &destination)?;
        } else {
            copy_source(&source, &destination, &bundle.publish_options, self.force_copy)?;
        }

        self.published
            .insert(cache_key, (destination.clone(), url.clone()));
        Ok((destination, url))
    }
}

/// Symlink the destination to the source directory (the containing directory
/// when the source is a single file)
fn link_source(source: &Path, destination: &Path) -> Result<()> {
    let target = if source.is_file() {
        source.parent().unwrap_or(source)
    } else {
        source
    };

    if let Ok(meta) = destination.symlink_metadata() {
        if !meta.file_type().is_symlink() {
            return Err(AssetError::PublishFailed {
                path: destination.display().to_string(),
                reason: "destination exists and is not a symbolic link".to_string(),
            });
        }
        match fs::read_link(destination) {
            Ok(existing) if existing == target => return Ok(()),
            _ => {
                // Stale link from an earlier source location
                warn!(destination = %destination.display(), "removing stale asset symlink");
                fs::remove_file(destination)
                    .map_err(|e| AssetError::publish_io(destination.display().to_string(), &e))?;
            }
        }
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AssetError::publish_io(parent.display().to_string(), &e))?;
    }

    debug!(source = %target.display(), destination = %destination.display(), "linking assets");
    symlink_dir(target, destination)
        .map_err(|e| AssetError::publish_io(destination.display().to_string(), &e))
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Recursively copy the source into the destination, honoring the bundle's
/// `only`/`except` filters
fn copy_source(
    source: &Path,
    destination: &Path,
    options: &PublishOptions,
    force_copy: bool,
) -> Result<()> {
    if destination.exists() && !(force_copy || options.force_copy) {
        debug!(destination = %destination.display(), "destination exists, skipping copy");
        return Ok(());
    }

    let only = compile_globs(&options.only)?;
    let except = compile_globs(&options.except)?;

    fs::create_dir_all(destination)
        .map_err(|e| AssetError::publish_io(destination.display().to_string(), &e))?;

    if source.is_file() {
        let name = source.file_name().unwrap_or(source.as_os_str());
        let target = destination.join(name);
        fs::copy(source, &target)
            .map_err(|e| AssetError::publish_io(target.display().to_string(), &e))?;
        return Ok(());
    }

    debug!(source = %source.display(), destination = %destination.display(), "copying assets");

    let mut walker = WalkDir::new(source).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| AssetError::PublishFailed {
            path: source.display().to_string(),
            reason: e.to_string(),
        })?;
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }

        let rel_str = path_utils::to_forward_slashes(rel);
        let candidate = CandidatePath::from(rel_str.as_str());

        if entry.file_type().is_dir() {
            // An excluded directory prunes its whole subtree; other
            // directories are created lazily when a file below them is
            // copied, so filtered-out trees leave nothing behind.
            if matches_any(&except, &candidate) {
                walker.skip_current_dir();
            }
            continue;
        }

        if matches_any(&except, &candidate) {
            continue;
        }
        if !only.is_empty() && !matches_any(&only, &candidate) {
            continue;
        }

        let target = destination.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AssetError::publish_io(parent.display().to_string(), &e))?;
        }
        fs::copy(entry.path(), &target)
            .map_err(|e| AssetError::publish_io(target.display().to_string(), &e))?;
    }

    Ok(())
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Glob<'_>>> {
    patterns
        .iter()
        .map(|pattern| {
            Glob::new(pattern).map_err(|e| AssetError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn matches_any(globs: &[Glob<'_>], candidate: &CandidatePath<'_>) -> bool {
    globs.iter().any(|glob| glob.matched(candidate).is_some())
}
