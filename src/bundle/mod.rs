//! Asset bundle descriptors
//!
//! A bundle is a named collection of CSS/JS file references plus dependency
//! edges and optional publish instructions. Bundles are plain data: the caller
//! authors them in YAML or constructs them in code and hands them to the
//! manager through a [`BundleRegistry`]. The manager never mutates them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Conventional values for the `position` attribute on JS files
///
/// The manager treats `position` as an opaque attribute; these constants
/// exist for callers and renderers that follow the head/body convention.
pub mod position {
    /// Emit in `<head>`
    pub const HEAD: i64 = 1;
    /// Emit at the beginning of `<body>`
    pub const BODY_BEGIN: i64 = 2;
    /// Emit before the closing `</body>` tag (the usual default)
    pub const BODY_END: i64 = 3;
}

/// Scalar HTML attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// HTML attributes attached to a registered file, keyed by attribute name
pub type Attributes = BTreeMap<String, AttrValue>;

/// Merge two attribute maps; keys in `over` win on collision
pub fn merge_attributes(base: &Attributes, over: &Attributes) -> Attributes {
    let mut merged = base.clone();
    for (key, value) in over {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// One CSS or JS file reference within a bundle
///
/// In YAML a file is either a bare path string or a map with `path` and
/// `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AssetFileSpec")]
pub struct AssetFile {
    /// Path relative to the bundle's base, an alias-form path, or an
    /// absolute URL
    pub path: String,

    /// Per-file attributes; win over bundle and manager defaults
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AssetFileSpec {
    Path(String),
    Full {
        path: String,
        #[serde(default)]
        attributes: Attributes,
    },
}

impl From<AssetFileSpec> for AssetFile {
    fn from(spec: AssetFileSpec) -> Self {
        match spec {
            AssetFileSpec::Path(path) => Self {
                path,
                attributes: Attributes::new(),
            },
            AssetFileSpec::Full { path, attributes } => Self { path, attributes },
        }
    }
}

impl AssetFile {
    /// Create a file reference with no attributes
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute (builder style)
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for AssetFile {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Filters and flags applied when a bundle's source tree is published
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishOptions {
    /// Glob patterns of relative paths to copy; empty means everything
    pub only: Vec<String>,

    /// Glob patterns of relative paths to skip, even when matched by `only`
    pub except: Vec<String>,

    /// Copy again even when the destination directory already exists
    pub force_copy: bool,
}

impl PublishOptions {
    /// True when neither an `only` nor an `except` filter is set
    pub fn is_unfiltered(&self) -> bool {
        self.only.is_empty() && self.except.is_empty()
    }
}

/// Declaration of one asset bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetBundle {
    /// Non-web-accessible source tree to publish, alias-form. When set,
    /// `base_path`/`base_url` are produced by the publisher.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,

    /// Web-accessible directory holding this bundle's files, alias-form.
    /// Ignored when `source_path` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Public URL prefix for this bundle's files, alias-form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// CSS files in emission order
    pub css: Vec<AssetFile>,

    /// JS files in emission order
    pub js: Vec<AssetFile>,

    /// Default attributes for every CSS file of this bundle
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub css_options: Attributes,

    /// Default attributes for every JS file of this bundle; commonly carries
    /// `position`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub js_options: Attributes,

    /// Names of bundles that must be registered before this one
    pub depends: Vec<String>,

    /// Filters and flags for publishing `source_path`
    pub publish_options: PublishOptions,
}

impl AssetBundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single bundle from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Caller-supplied mapping from bundle name to descriptor
///
/// Insertion order is preserved so YAML-declared registries keep their
/// authoring order. Re-inserting a name replaces the descriptor in place.
#[derive(Debug, Clone, Default)]
pub struct BundleRegistry {
    order: Vec<String>,
    bundles: HashMap<String, AssetBundle>,
}

impl BundleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a bundle
    pub fn insert(&mut self, name: impl Into<String>, bundle: AssetBundle) {
        let name = name.into();
        if !self.bundles.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.bundles.insert(name, bundle);
    }

    /// Look up a bundle by name
    pub fn get(&self, name: &str) -> Option<&AssetBundle> {
        self.bundles.get(name)
    }

    /// True if a bundle with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.bundles.contains_key(name)
    }

    /// Bundle names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of bundles
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no bundles are registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Parse a registry from a YAML mapping of name to bundle
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml)?;
        let mut registry = Self::new();
        for (key, value) in mapping {
            let name: String = serde_yaml::from_value(key)?;
            let bundle: AssetBundle = serde_yaml::from_value(value)?;
            registry.insert(name, bundle);
        }
        Ok(registry)
    }
}
