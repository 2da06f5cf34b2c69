//! Publication behavior across publisher instances

mod common;

use common::TestWorkspace;
use webassets::{hash, AssetBundle, AssetFile};

fn source_bundle() -> AssetBundle {
    AssetBundle {
        source_path: Some("@sources".to_string()),
        css: vec![AssetFile::new("css/stub.css")],
        js: vec![AssetFile::new("js/stub.js"), AssetFile::new("js/jquery.js")],
        ..AssetBundle::default()
    }
}

#[test]
fn fingerprint_is_stable_across_publisher_instances() {
    let workspace = TestWorkspace::new();
    let bundle = source_bundle();

    let first = workspace.publisher().publish(&bundle).unwrap();
    let second = workspace.publisher().publish(&bundle).unwrap();

    // Same source content and mtime: same destination and URL, and the
    // second run performed no copy (destination already existed)
    assert_eq!(first, second);
}

#[test]
fn touched_source_gets_a_new_fingerprint() {
    let workspace = TestWorkspace::new();
    let bundle = source_bundle();

    let (first_path, _) = workspace.publisher().publish(&bundle).unwrap();

    // Move the source mtime forward by a full second; the default
    // fingerprint has one-second granularity
    let later = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
    let file = std::fs::File::open(workspace.path.join("sources")).unwrap();
    file.set_modified(later).unwrap();

    let (second_path, _) = workspace.publisher().publish(&bundle).unwrap();
    assert_ne!(first_path, second_path);
}

#[test]
fn symlink_publish_points_at_the_source() {
    let workspace = TestWorkspace::new();
    let mut publisher = workspace.publisher();
    publisher.set_link_assets(true);

    let (base_path, _) = publisher.publish(&source_bundle()).unwrap();

    assert!(base_path.symlink_metadata().unwrap().file_type().is_symlink());
    assert!(base_path.join("js/jquery.js").is_file());

    // Edits to the source are visible through the link without republishing
    workspace.write_file("sources/js/jquery.js", "var jQuery = {};");
    assert_eq!(
        std::fs::read_to_string(base_path.join("js/jquery.js")).unwrap(),
        "var jQuery = {};"
    );

    // Unlinking leaves no orphan copy
    std::fs::remove_file(&base_path).unwrap();
    assert!(workspace.file_exists("sources/js/jquery.js"));
}

#[test]
fn link_and_copy_modes_use_distinct_fingerprints() {
    let workspace = TestWorkspace::new();
    let bundle = source_bundle();

    let (copy_path, _) = workspace.publisher().publish(&bundle).unwrap();

    let mut linking = workspace.publisher();
    linking.set_link_assets(true);
    let (link_path, _) = linking.publish(&bundle).unwrap();

    assert_ne!(copy_path, link_path);
}

#[test]
fn only_filter_prunes_unmatched_trees() {
    let workspace = TestWorkspace::new();
    let mut bundle = source_bundle();
    bundle.publish_options.only = vec!["js/*".to_string()];

    let (base_path, _) = workspace.publisher().publish(&bundle).unwrap();

    assert!(base_path.is_dir());
    assert!(!base_path.join("css").exists());
    assert!(base_path.join("js/stub.js").is_file());
    assert!(base_path.join("js/jquery.js").is_file());
}

#[test]
fn content_fingerprint_callback_detects_edits_within_the_same_second() {
    let workspace = TestWorkspace::new();
    let bundle = source_bundle();

    let fingerprint_of = |workspace: &TestWorkspace| {
        let mut publisher = workspace.publisher();
        publisher.set_hash_callback(Box::new(|path| {
            hash::content_fingerprint(path).unwrap_or_else(|_| "unhashable".to_string())
        }));
        let (path, _) = publisher.publish(&bundle).unwrap();
        path.file_name().unwrap().to_string_lossy().to_string()
    };

    let before = fingerprint_of(&workspace);
    workspace.write_file("sources/css/stub.css", ".stub { color: red }");
    let after = fingerprint_of(&workspace);

    assert_ne!(before, after);
}
