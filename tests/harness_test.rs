//! Run the JSON fixtures in harness/ through the loader and transform
use mixology::common::sourcemap::{HasSmid, SourceMap};
use mixology::core::config::RewriteConfig;
use mixology::core::expr::{Expr, RcExpr};
use mixology::core::publish::MetadataRegistry;
use mixology::core::transform::transform;
use mixology::driver::config::load_config;
use mixology::driver::error::MixologyError;
use mixology::driver::options::{MixologyCli, MixologyOptions};
use mixology::driver::prepare;
use mixology::driver::source::SourceLoader;
use mixology::import::json::read_json;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new("harness").join(name)
}

/// Load a fixture, returning the loader and the tree read
fn load(name: &str) -> (SourceLoader, RcExpr) {
    let mut loader = SourceLoader::new();
    if let Err(e) = loader.load(&fixture(name)) {
        panic!(
            "Failed to load {}.\n{}",
            name,
            loader.diagnose_to_string(&e.to_diagnostic())
        );
    }
    let tree = loader.trees()[0].1.clone();
    (loader, tree)
}

fn expected(name: &str) -> RcExpr {
    let text = fs::read_to_string(fixture(name)).unwrap();
    read_json(&mut SourceMap::new(), 0, &text).unwrap()
}

fn run_test(input: &str, config: &RewriteConfig) -> (RcExpr, MetadataRegistry) {
    let (_, tree) = load(input);
    let mut registry = MetadataRegistry::new();
    let output = transform(&tree, config, &mut registry);
    (output, registry)
}

#[test]
pub fn test_harness_001() {
    let (output, registry) = run_test("001_publishable.json", &RewriteConfig::default());
    assert_eq!(output, expected("001_publishable.expected.json"));

    let meta = registry.get("Publishable").unwrap();
    assert_eq!(meta.methods, vec!["publish!", "author_name", "title", "live?"]);
    assert_eq!(meta.lazy_singles, vec!["author"]);
    assert_eq!(meta.scopes, vec!["recent"]);
    assert_eq!(
        meta.enum_values.get("status"),
        Some(&vec!["draft".to_string(), "published".to_string()])
    );
}

#[test]
pub fn test_harness_002() {
    let (output, registry) = run_test("002_archivable.json", &RewriteConfig::default());
    assert_eq!(output, expected("002_archivable.expected.json"));

    let meta = registry.get("Admin::Archivable").unwrap();
    assert_eq!(meta.methods, vec!["archived_by", "archive!", "log_archive"]);
    assert_eq!(meta.private_methods, vec!["log_archive"]);
    assert!(registry.get("Admin").is_none());
}

#[test]
pub fn test_harness_002_configured() {
    let config = load_config(&fixture("archivable.toml")).unwrap();
    let (output, _) = run_test("002_archivable.json", &config);

    let mut touches = vec![];
    collect_sends(&output, "touch", &mut touches);
    assert_eq!(touches.len(), 1);
    assert!(matches!(&*touches[0].inner, Expr::Send(_, None, _, _, _)));
}

#[test]
pub fn test_harness_003() {
    let (loader, tree) = load("003_plain.json");
    let mut registry = MetadataRegistry::new();
    let output = transform(&tree, &RewriteConfig::default(), &mut registry);
    assert_eq!(output, tree);
    assert!(registry.is_empty());

    let info = loader.source_map().source_info(&output).unwrap();
    assert_eq!(info.span.start().to_usize(), 0);
    assert_eq!(info.span.end().to_usize(), 52);
    assert!(output.smid().is_valid());
}

#[test]
pub fn test_harness_004() {
    let mut loader = SourceLoader::new();
    let err = loader.load(&fixture("004_broken.json")).unwrap_err();
    assert!(matches!(err, MixologyError::Source(_)));
    let text = loader.diagnose_to_string(&err.to_diagnostic());
    assert!(text.contains("004_broken.json"));
    assert!(text.contains("wrong number of children for def node at $/2"));
}

#[test]
pub fn test_driver_writes_output_and_metadata() {
    let dir = std::env::temp_dir().join(format!("mixology-harness-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let out = dir.join("out.json");
    let meta = dir.join("meta.json");

    let cli = MixologyCli::parse_from([
        "mixology".to_string(),
        "-x".to_string(),
        "json".to_string(),
        "-o".to_string(),
        out.to_string_lossy().to_string(),
        "--metadata".to_string(),
        meta.to_string_lossy().to_string(),
        fixture("001_publishable.json").to_string_lossy().to_string(),
    ]);
    let opt = MixologyOptions::from(cli);
    let mut loader = SourceLoader::new();
    prepare::prepare(&opt, &mut loader).unwrap();

    let written = read_json(&mut SourceMap::new(), 0, &fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, expected("001_publishable.expected.json"));

    let registry: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&meta).unwrap()).unwrap();
    assert_eq!(
        registry["Publishable"]["associations"]["author"],
        serde_json::json!("lazy_single")
    );

    fs::remove_dir_all(&dir).unwrap();
}

fn collect_sends(expr: &RcExpr, name: &str, found: &mut Vec<RcExpr>) {
    if let Expr::Send(_, _, n, _, _) = &*expr.inner {
        if n == name {
            found.push(expr.clone());
        }
    }
    expr.visit(&mut |e| collect_sends(e, name, found));
}
