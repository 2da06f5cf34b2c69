//! Common test utilities for webassets integration tests

use std::path::PathBuf;

use tempfile::TempDir;
use webassets::{Aliases, AssetManager, AssetPublisher, BundleRegistry};

/// A test workspace with a webroot and a non-public asset source tree
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create a new workspace with the standard layout:
    /// `public/` is the webroot, `sources/` holds unpublished assets
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        let workspace = Self { temp, path };
        workspace.write_file("public/.keep", "");
        workspace.write_file("sources/css/stub.css", ".stub {}");
        workspace.write_file("sources/js/stub.js", "var stub;");
        workspace.write_file("sources/js/jquery.js", "var jQuery;");
        workspace
    }

    /// Standard alias table rooted at this workspace
    pub fn aliases(&self) -> Aliases {
        Aliases::from_pairs([
            ("@root", self.path.display().to_string()),
            ("@public", "@root/public".to_string()),
            ("@basePath", "@public/assets".to_string()),
            ("@baseUrl", "/baseUrl".to_string()),
            ("@web", "@baseUrl".to_string()),
            ("@sources", "@root/sources".to_string()),
        ])
    }

    /// Publisher writing under `@basePath` and serving from `@baseUrl`
    pub fn publisher(&self) -> AssetPublisher {
        AssetPublisher::new(self.aliases(), "@basePath", "@baseUrl")
    }

    /// Manager over the given registry with the standard globals configured
    pub fn manager(&self, registry: BundleRegistry) -> AssetManager {
        let mut manager = AssetManager::new(self.aliases(), registry, self.publisher());
        manager.set_base_path("@public");
        manager.set_base_url("@baseUrl");
        manager
    }

    /// Write a file in the workspace, creating parent directories
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from the workspace
    pub fn read_file(&self, path: &str) -> String {
        let file_path = self.path.join(path);
        std::fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists in the workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }
}
