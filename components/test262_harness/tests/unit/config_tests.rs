//! Unit tests for configuration loading

use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use test262_harness::{ConfigError, HarnessConfig, OutputFormat};

#[test]
fn test_full_config() {
    let yaml = r#"
test_root: /suite/test
include_dir: /suite/harness
timeout_ms: 2500
jobs: 4
strict_variants: false
filter: built-ins/Array
limit: 100
output: json
features:
  unsupported: [Atomics, SharedArrayBuffer]
engine:
  command: d8
  args: [--harmony]
  module_args: [--module]
"#;
    let config = HarnessConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.test_root, Some(PathBuf::from("/suite/test")));
    assert_eq!(config.timeout(), Duration::from_millis(2500));
    assert_eq!(config.jobs, 4);
    assert!(!config.strict_variants);
    assert_eq!(config.output, OutputFormat::Json);
    assert!(!config.is_feature_supported("Atomics"));
    assert!(config.is_feature_supported("class"));

    let engine = config.engine.unwrap();
    assert_eq!(engine.command, "d8");
    assert_eq!(engine.args, vec!["--harmony"]);
    assert_eq!(engine.module_args, vec!["--module"]);
    assert_eq!(engine.parse_only_args, None);
}

#[test]
fn test_empty_text_gives_defaults() {
    assert_eq!(HarnessConfig::from_yaml_str("  \n").unwrap(), HarnessConfig::default());
}

#[test]
fn test_unknown_key_is_rejected() {
    let err = HarnessConfig::from_yaml_str("timeout: 10\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_out_of_range_values() {
    let err = HarnessConfig::from_yaml_str("timeout_ms: 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "timeout_ms", .. }));

    let err = HarnessConfig::from_yaml_str("jobs: 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "jobs", .. }));

    let err = HarnessConfig::from_yaml_str("engine:\n  command: ''\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "engine.command", .. }));
}

#[test]
fn test_unsupported_features_keep_order() {
    let config =
        HarnessConfig::from_yaml_str("features:\n  supported: [class, Symbol]\n").unwrap();
    let required = vec![
        "Symbol".to_string(),
        "Atomics".to_string(),
        "BigInt".to_string(),
    ];
    assert_eq!(config.unsupported_features(&required), vec!["Atomics", "BigInt"]);
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test262.yaml");
    fs::write(&path, "timeout_ms: 50\n").unwrap();
    assert_eq!(HarnessConfig::load(&path).unwrap().timeout_ms, 50);

    let err = HarnessConfig::load(temp_dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
