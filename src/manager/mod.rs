//! Asset registration orchestration
//!
//! The manager walks bundle dependency graphs depth-first, publishes and
//! converts bundles that carry a local source tree, rewrites every file
//! reference to its final public URL, and accumulates the ordered CSS/JS
//! output maps consumed by the HTML-rendering layer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::aliases::Aliases;
use crate::bundle::{merge_attributes, AssetBundle, AssetFile, Attributes, BundleRegistry};
use crate::converter::{AssetConverter, NullConverter};
use crate::error::{AssetError, Result};
use crate::path_utils;
use crate::publisher::AssetPublisher;

/// One emitted `<link>`/`<script>` entry: final URL plus merged attributes
///
/// JS attributes may carry a `position` key; the renderer decides head/body
/// placement from it, the manager treats it as opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredFile {
    pub url: String,
    pub attributes: Attributes,
}

/// Insertion-ordered URL-keyed map of registered files
///
/// Re-inserting an existing URL overwrites the value in place, keeping the
/// key's original slot (last write wins on attributes, first write wins on
/// position in the emission order).
#[derive(Debug, Clone, Default)]
pub struct FileMap {
    entries: Vec<(String, RegisteredFile)>,
}

impl FileMap {
    fn insert(&mut self, url: String, file: RegisteredFile) {
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == url) {
            entry.1 = file;
        } else {
            self.entries.push((url, file));
        }
    }

    /// Look up an entry by its final URL
    pub fn get(&self, url: &str) -> Option<&RegisteredFile> {
        self.entries
            .iter()
            .find(|(key, _)| key == url)
            .map(|(_, file)| file)
    }

    /// Entries in emission order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisteredFile)> {
        self.entries.iter().map(|(key, file)| (key.as_str(), file))
    }

    /// URLs in emission order
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A bundle the manager has fully registered, together with the base
/// locations resolved for it
///
/// Resolved locations live here instead of being written back onto the
/// caller's descriptor; the registry stays read-only.
#[derive(Debug, Clone)]
pub struct RegisteredBundle {
    /// The descriptor, with converted file paths substituted
    pub bundle: AssetBundle,

    /// Web-accessible directory holding the bundle's files, if any
    pub base_path: Option<PathBuf>,

    /// Public URL prefix the bundle's files were registered under, if any
    pub base_url: Option<String>,
}

/// Orchestrates bundle registration and owns the output file maps
pub struct AssetManager {
    aliases: Aliases,
    registry: BundleRegistry,
    publisher: AssetPublisher,
    converter: Box<dyn AssetConverter>,
    base_path: Option<String>,
    base_url: Option<String>,
    append_timestamp: bool,
    asset_map: HashMap<String, String>,
    css_default_options: Attributes,
    js_default_options: Attributes,
    bundles: HashMap<String, RegisteredBundle>,
    order: Vec<String>,
    css_files: FileMap,
    js_files: FileMap,
}

impl AssetManager {
    /// Create a manager over a caller-supplied bundle registry
    ///
    /// Starts with a pass-through converter; install a
    /// [`crate::converter::CommandConverter`] via [`Self::set_converter`]
    /// when bundles reference preprocessor sources.
    pub fn new(aliases: Aliases, registry: BundleRegistry, publisher: AssetPublisher) -> Self {
        Self {
            aliases,
            registry,
            publisher,
            converter: Box::new(NullConverter),
            base_path: None,
            base_url: None,
            append_timestamp: false,
            asset_map: HashMap::new(),
            css_default_options: Attributes::new(),
            js_default_options: Attributes::new(),
            bundles: HashMap::new(),
            order: Vec::new(),
            css_files: FileMap::default(),
            js_files: FileMap::default(),
        }
    }

    /// Replace the converter collaborator
    pub fn set_converter(&mut self, converter: Box<dyn AssetConverter>) {
        self.converter = converter;
    }

    /// Global webroot directory (alias-form); used to locate files for
    /// cache-busting timestamps when a bundle has no base path of its own
    pub fn set_base_path(&mut self, base_path: impl Into<String>) {
        self.base_path = Some(base_path.into());
    }

    /// Global URL prefix (alias-form) for bundles without a base URL of
    /// their own
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = Some(base_url.into());
    }

    /// Append `?v=<mtime>` to local file URLs
    pub fn set_append_timestamp(&mut self, append: bool) {
        self.append_timestamp = append;
    }

    /// Override computed URLs per file path or file name
    ///
    /// An entry like `jquery.js -> //cdn.example.com/jquery.js` replaces the
    /// URL of any bundle file named `jquery.js`, regardless of that bundle's
    /// base URL.
    pub fn set_asset_map(&mut self, map: HashMap<String, String>) {
        self.asset_map = map;
    }

    /// Manager-global default attributes for CSS files
    pub fn set_css_default_options(&mut self, options: Attributes) {
        self.css_default_options = options;
    }

    /// Manager-global default attributes for JS files
    pub fn set_js_default_options(&mut self, options: Attributes) {
        self.js_default_options = options;
    }

    /// Ordered CSS output map (final URL to entry)
    pub fn css_files(&self) -> &FileMap {
        &self.css_files
    }

    /// Ordered JS output map (final URL to entry)
    pub fn js_files(&self) -> &FileMap {
        &self.js_files
    }

    /// A bundle already processed by `register`, if any
    pub fn registered_bundle(&self, name: &str) -> Option<&RegisteredBundle> {
        self.bundles.get(name)
    }

    /// True when the named bundle has been registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.bundles.contains_key(name)
    }

    /// Names of registered bundles, dependencies first
    pub fn registered_bundles(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Drop all accumulated bundles and output entries
    pub fn clear(&mut self) {
        self.bundles.clear();
        self.order.clear();
        self.css_files.clear();
        self.js_files.clear();
    }

    /// Register bundles by name, dependencies first
    ///
    /// Re-registering an already registered name is a no-op. A failure
    /// aborts the remaining names; entries registered before the failure
    /// stay in the output maps.
    ///
    /// # Errors
    ///
    /// `BundleNotFound` for names missing from the registry,
    /// `CircularDependency` when the depends graph has a cycle, plus any
    /// publish, conversion, or alias error.
    pub fn register<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let mut stack = Vec::new();
            self.register_bundle(name.as_ref(), &mut stack)?;
        }
        Ok(())
    }

    fn register_bundle(&mut self, name: &str, stack: &mut Vec<String>) -> Result<()> {
        if self.bundles.contains_key(name) {
            return Ok(());
        }
        if stack.iter().any(|seen| seen == name) {
            let mut chain = stack.join(" -> ");
            chain.push_str(" -> ");
            chain.push_str(name);
            return Err(AssetError::CircularDependency { chain });
        }

        let bundle = self
            .registry
            .get(name)
            .ok_or_else(|| AssetError::BundleNotFound {
                name: name.to_string(),
            })?
            .clone();

        stack.push(name.to_string());
        for dep in &bundle.depends {
            self.register_bundle(dep, stack)?;
        }
        stack.pop();

        debug!(bundle = name, "registering asset bundle");
        let resolved = self.resolve_bundle(bundle)?;
        self.register_bundle_files(&resolved)?;
        self.bundles.insert(name.to_string(), resolved);
        self.order.push(name.to_string());
        Ok(())
    }

    /// Publish/convert a bundle as needed and resolve its base locations
    fn resolve_bundle(&mut self, mut bundle: AssetBundle) -> Result<RegisteredBundle> {
        if bundle.source_path.is_some() {
            let source_alias = bundle.source_path.as_deref().unwrap_or("");
            let source = PathBuf::from(self.aliases.get(source_alias)?);

            for file in bundle.css.iter_mut().chain(bundle.js.iter_mut()) {
                if !path_utils::is_absolute_url(&file.path) {
                    file.path = self.converter.convert(&file.path, &source)?;
                }
            }

            let (base_path, base_url) = self.publisher.publish(&bundle)?;
            return Ok(RegisteredBundle {
                bundle,
                base_path: Some(base_path),
                base_url: Some(base_url),
            });
        }

        let base_path = match bundle.base_path.as_deref().or(self.base_path.as_deref()) {
            Some(alias) => Some(PathBuf::from(self.aliases.get(alias)?)),
            None => None,
        };
        let base_url = match bundle.base_url.as_deref().or(self.base_url.as_deref()) {
            Some(alias) => Some(self.aliases.get(alias)?),
            None => None,
        };
        Ok(RegisteredBundle {
            bundle,
            base_path,
            base_url,
        })
    }

    fn register_bundle_files(&mut self, resolved: &RegisteredBundle) -> Result<()> {
        for file in &resolved.bundle.css {
            let defaults =
                merge_attributes(&self.css_default_options, &resolved.bundle.css_options);
            let (url, attributes) = self.resolve_bundle_file(file, resolved, &defaults)?;
            self.css_files.insert(url.clone(), RegisteredFile { url, attributes });
        }
        for file in &resolved.bundle.js {
            let defaults = merge_attributes(&self.js_default_options, &resolved.bundle.js_options);
            let (url, attributes) = self.resolve_bundle_file(file, resolved, &defaults)?;
            self.js_files.insert(url.clone(), RegisteredFile { url, attributes });
        }
        Ok(())
    }

    /// Compute a bundle file's final URL and merged attributes
    ///
    /// Precedence: literal absolute URL, asset-map override, alias-resolved
    /// absolute URL or root-relative path, and finally the bundle (or
    /// manager) base URL joined with the relative path.
    fn resolve_bundle_file(
        &self,
        file: &AssetFile,
        resolved: &RegisteredBundle,
        defaults: &Attributes,
    ) -> Result<(String, Attributes)> {
        let attributes = merge_attributes(defaults, &file.attributes);

        if path_utils::is_absolute_url(&file.path) {
            return Ok((file.path.clone(), attributes));
        }
        if let Some(mapped) = self.asset_map_lookup(&file.path) {
            return Ok((mapped, attributes));
        }

        let path = self.aliases.get(&file.path)?;
        if path_utils::is_absolute_url(&path) {
            return Ok((path, attributes));
        }
        if path.starts_with('/') {
            return Ok((path, attributes));
        }

        let base_url = resolved.base_url.as_deref().unwrap_or("");
        let mut url = path_utils::join_url(base_url, &path);
        if self.append_timestamp {
            if let Some(base_path) = resolved.base_path.as_deref() {
                url = append_timestamp(url, &base_path.join(&path));
            }
        }
        Ok((url, attributes))
    }

    /// Register a single CSS file, bypassing bundles
    ///
    /// The path is alias-resolved and used as-is; attributes merge over the
    /// manager's CSS defaults.
    pub fn register_css_file(&mut self, path: &str, attributes: Attributes) -> Result<()> {
        let url = self.resolve_direct_file(path)?;
        let attributes = merge_attributes(&self.css_default_options, &attributes);
        self.css_files.insert(url.clone(), RegisteredFile { url, attributes });
        Ok(())
    }

    /// Register a single JS file, bypassing bundles
    pub fn register_js_file(&mut self, path: &str, attributes: Attributes) -> Result<()> {
        let url = self.resolve_direct_file(path)?;
        let attributes = merge_attributes(&self.js_default_options, &attributes);
        self.js_files.insert(url.clone(), RegisteredFile { url, attributes });
        Ok(())
    }

    fn resolve_direct_file(&self, path: &str) -> Result<String> {
        if path_utils::is_absolute_url(path) {
            return Ok(path.to_string());
        }
        let url = self.aliases.get(path)?;
        if path_utils::is_absolute_url(&url) {
            return Ok(url);
        }
        if self.append_timestamp {
            if let Some(local) = self.local_path_for_url(&url)? {
                return Ok(append_timestamp(url, &local));
            }
        }
        Ok(url)
    }

    /// Map a site-relative URL back to a filesystem path under the global
    /// webroot, when both globals are configured and the URL is under the
    /// global base URL
    fn local_path_for_url(&self, url: &str) -> Result<Option<PathBuf>> {
        let (Some(base_path), Some(base_url)) =
            (self.base_path.as_deref(), self.base_url.as_deref())
        else {
            return Ok(None);
        };
        let base_url = self.aliases.get(base_url)?;
        let prefix = base_url.trim_end_matches('/');
        let Some(rest) = url.strip_prefix(prefix) else {
            return Ok(None);
        };
        let base_path = self.aliases.get(base_path)?;
        Ok(Some(
            PathBuf::from(base_path).join(rest.trim_start_matches('/')),
        ))
    }

    fn asset_map_lookup(&self, path: &str) -> Option<String> {
        if let Some(mapped) = self.asset_map.get(path) {
            return Some(mapped.clone());
        }
        let name = Path::new(path).file_name()?.to_str()?;
        self.asset_map.get(name).cloned()
    }
}

/// Append `?v=<mtime>` when the local file exists; missing files degrade
/// silently since cache busting is best effort
fn append_timestamp(url: String, local: &Path) -> String {
    match path_utils::mtime_seconds(local) {
        Some(mtime) => format!("{url}?v={mtime}"),
        None => {
            debug!(path = %local.display(), "timestamp source missing, url left as is");
            url
        }
    }
}
