//! Symbolic path alias table
//!
//! Aliases map `@name` tokens to filesystem paths or URL prefixes. Values may
//! themselves start with another alias (`@basePath = @public/assets`), so
//! resolution is recursive with a fixed depth cap; a self-referencing alias
//! is a configuration error, not a hang.

use std::collections::HashMap;

use crate::error::{AssetError, Result};

/// Maximum nesting depth during alias expansion
const MAX_DEPTH: usize = 32;

/// Table of `@name` tokens and their expansions
#[derive(Debug, Clone, Default)]
pub struct Aliases {
    map: HashMap<String, String>,
}

impl Aliases {
    /// Create an empty alias table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut aliases = Self::new();
        for (name, value) in pairs {
            aliases.set(name, value);
        }
        aliases
    }

    /// Register or replace an alias
    ///
    /// The name is normalized to carry a leading `@`. The value may contain
    /// other aliases; it is expanded at lookup time, not here.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = if name.starts_with('@') {
            name
        } else {
            format!("@{name}")
        };
        self.map.insert(key, value.into());
    }

    /// Resolve a path that may start with an alias token
    ///
    /// Paths without a leading `@` are returned unchanged. The token is the
    /// leading path segment; its expansion is resolved recursively and the
    /// remainder appended.
    ///
    /// # Errors
    ///
    /// `UnknownAlias` when the token has no registered value,
    /// `AliasDepthExceeded` when expansion recurses past the depth cap.
    pub fn get(&self, path: &str) -> Result<String> {
        self.resolve(path, 0)
    }

    fn resolve(&self, path: &str, depth: usize) -> Result<String> {
        if !path.starts_with('@') {
            return Ok(path.to_string());
        }
        if depth >= MAX_DEPTH {
            return Err(AssetError::AliasDepthExceeded {
                path: path.to_string(),
            });
        }

        let (token, rest) = match path.find('/') {
            Some(i) => path.split_at(i),
            None => (path, ""),
        };

        let value = self
            .map
            .get(token)
            .ok_or_else(|| AssetError::UnknownAlias {
                token: token.to_string(),
            })?;

        let resolved = self.resolve(value, depth + 1)?;
        Ok(format!("{resolved}{rest}"))
    }
}
