//! webassets - web asset registration and publishing pipeline
//!
//! Registers named asset bundles (CSS/JS file references plus dependency
//! edges), resolves their dependency order, converts preprocessor sources to
//! distributables, publishes non-web-accessible source trees into the public
//! webroot with content-addressed directory names, and emits ordered
//! `<link>`/`<script>` metadata for an HTML-rendering layer.
//!
//! ```no_run
//! use webassets::{Aliases, AssetManager, AssetPublisher, BundleRegistry};
//!
//! # fn main() -> webassets::Result<()> {
//! let aliases = Aliases::from_pairs([
//!     ("@root", "/var/app"),
//!     ("@basePath", "@root/public/assets"),
//!     ("@baseUrl", "/assets"),
//! ]);
//!
//! let registry = BundleRegistry::from_yaml(
//!     r#"
//! jquery:
//!   base_url: /js
//!   js: [jquery.js]
//! site:
//!   source_path: "@root/assets"
//!   css: [css/site.css]
//!   depends: [jquery]
//! "#,
//! )?;
//!
//! let publisher = AssetPublisher::new(aliases.clone(), "@basePath", "@baseUrl");
//! let mut manager = AssetManager::new(aliases, registry, publisher);
//! manager.register(["site"])?;
//!
//! for (url, file) in manager.css_files().iter() {
//!     println!("<link href=\"{url}\"> {:?}", file.attributes);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aliases;
pub mod bundle;
pub mod converter;
pub mod error;
pub mod hash;
pub mod manager;
pub mod path_utils;
pub mod publisher;

pub use aliases::Aliases;
pub use bundle::{AssetBundle, AssetFile, AttrValue, Attributes, BundleRegistry, PublishOptions};
pub use converter::{AssetConverter, CommandConverter, NullConverter};
pub use error::{AssetError, Result};
pub use manager::{AssetManager, FileMap, RegisteredBundle, RegisteredFile};
pub use publisher::AssetPublisher;
