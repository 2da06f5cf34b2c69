//! End-to-end registration tests: YAML registry through to output maps

mod common;

use common::TestWorkspace;
use webassets::{AttrValue, Attributes, BundleRegistry, CommandConverter};

fn registry() -> BundleRegistry {
    BundleRegistry::from_yaml(
        r#"
jquery:
  base_url: /js
  js:
    - jquery.js
  js_options:
    position: 3
source:
  source_path: "@sources"
  css:
    - css/stub.css
  js:
    - js/stub.js
  depends:
    - jquery
base:
  base_path: "@public"
  base_url: "@baseUrl"
  css:
    - path: css/base.css
      attributes:
        media: print
"#,
    )
    .expect("registry parses")
}

#[test]
fn registers_source_bundle_with_dependencies() {
    let workspace = TestWorkspace::new();
    let mut manager = workspace.manager(registry());

    manager.register(["source"]).unwrap();

    // Dependency first, then the dependent's published files
    let js_urls: Vec<_> = manager.js_files().urls().collect();
    assert_eq!(js_urls.len(), 2);
    assert_eq!(js_urls[0], "/js/jquery.js");
    assert!(js_urls[1].starts_with("/baseUrl/"));
    assert!(js_urls[1].ends_with("/js/stub.js"));

    // The published copy exists under the webroot
    let registered = manager.registered_bundle("source").expect("registered");
    let base_path = registered.base_path.as_ref().expect("published");
    assert!(base_path.join("css/stub.css").is_file());
    assert!(base_path.starts_with(workspace.path.join("public/assets")));
}

#[test]
fn reregistering_changes_nothing_and_skips_publish() {
    let workspace = TestWorkspace::new();
    let mut manager = workspace.manager(registry());

    manager.register(["source"]).unwrap();
    let registered = manager.registered_bundle("source").expect("registered");
    let base_path = registered.base_path.clone().expect("published");
    let before: Vec<String> = manager.js_files().urls().map(String::from).collect();

    // Tamper with the published copy; a second register must not repair it
    std::fs::write(base_path.join("css/stub.css"), "tampered").unwrap();
    manager.register(["source"]).unwrap();

    let after: Vec<String> = manager.js_files().urls().map(String::from).collect();
    assert_eq!(before, after);
    assert_eq!(
        std::fs::read_to_string(base_path.join("css/stub.css")).unwrap(),
        "tampered"
    );
}

#[test]
fn bundles_without_source_never_write_to_disk() {
    let workspace = TestWorkspace::new();
    workspace.write_file("public/css/base.css", ".base {}");
    let mut manager = workspace.manager(registry());

    manager.register(["base", "jquery"]).unwrap();

    // Nothing was published into the assets directory
    assert!(!workspace.file_exists("public/assets"));
    assert!(manager.css_files().get("/baseUrl/css/base.css").is_some());
}

#[test]
fn yaml_declared_attributes_reach_the_output_map() {
    let workspace = TestWorkspace::new();
    workspace.write_file("public/css/base.css", ".base {}");
    let mut manager = workspace.manager(registry());

    manager.register(["base"]).unwrap();

    let entry = manager
        .css_files()
        .get("/baseUrl/css/base.css")
        .expect("entry");
    assert_eq!(entry.attributes.get("media"), Some(&AttrValue::Str("print".into())));
}

#[test]
fn append_timestamp_tracks_the_published_file() {
    let workspace = TestWorkspace::new();
    let mut manager = workspace.manager(registry());
    manager.set_append_timestamp(true);

    manager.register(["source"]).unwrap();

    let registered = manager.registered_bundle("source").expect("registered");
    let base_path = registered.base_path.as_ref().expect("published");
    let mtime = base_path
        .join("css/stub.css")
        .metadata()
        .and_then(|m| m.modified())
        .unwrap()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let url = manager.css_files().urls().next().expect("css url");
    assert!(url.ends_with(&format!("/css/stub.css?v={mtime}")), "url was: {url}");
}

#[test]
fn converted_sources_are_registered_under_the_target_extension() {
    let workspace = TestWorkspace::new();
    workspace.write_file("sources/css/site.scss", "$c: red; body { color: $c }");

    let registry = BundleRegistry::from_yaml(
        r#"
scss:
  source_path: "@sources"
  css:
    - css/site.scss
  publish_options:
    only:
      - "css/*"
"#,
    )
    .expect("registry parses");

    let mut manager = workspace.manager(registry);
    let mut converter = CommandConverter::empty();
    converter.set_command("scss", "css", "cp {from} {to}");
    manager.set_converter(Box::new(converter));

    manager.register(["scss"]).unwrap();

    let url = manager.css_files().urls().next().expect("css url");
    assert!(url.ends_with("/css/site.css"));

    // The conversion output landed in the source tree and was published
    assert!(workspace.file_exists("sources/css/site.css"));
    let registered = manager.registered_bundle("scss").expect("registered");
    let base_path = registered.base_path.as_ref().expect("published");
    assert!(base_path.join("css/site.css").is_file());
    assert!(!base_path.join("js").exists());
}

#[test]
fn direct_registration_mixes_with_bundles() {
    let workspace = TestWorkspace::new();
    let mut manager = workspace.manager(registry());

    manager.register(["jquery"]).unwrap();
    manager
        .register_js_file("https://cdn.example.com/analytics.js", Attributes::new())
        .unwrap();

    let urls: Vec<_> = manager.js_files().urls().collect();
    assert_eq!(urls, vec!["/js/jquery.js", "https://cdn.example.com/analytics.js"]);
}
