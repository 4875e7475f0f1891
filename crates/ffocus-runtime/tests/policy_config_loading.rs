#![forbid(unsafe_code)]
#![cfg(feature = "policy-config")]

//! Loading [`ReconcileConfig`] from TOML and JSON policy files.
//!
//! Run:
//!   cargo test -p ffocus-runtime --features policy-config --test policy_config_loading

use std::io::Write;

use ffocus_runtime::{ConfigError, ReconcileConfig};
use web_time::Duration;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn toml_file_overrides_selected_fields() {
    let file = write_temp(
        ".toml",
        r#"
max_snapshots = 8
page_ack_timeout_ms = 150
highlight_ms = 1200
"#,
    );
    let config = ReconcileConfig::from_toml_file(file.path()).expect("valid policy");
    assert_eq!(config.max_snapshots, 8);
    assert_eq!(config.page_ack_duration(), Duration::from_millis(150));
    assert_eq!(config.highlight_duration(), Duration::from_millis(1200));
    // Untouched fields keep their defaults.
    let defaults = ReconcileConfig::default();
    assert_eq!(config.deadline_ms, defaults.deadline_ms);
    assert_eq!(config.settle_rechecks, defaults.settle_rechecks);
}

#[test]
fn empty_toml_is_default() {
    let config = ReconcileConfig::from_toml_str("").expect("defaults are valid");
    assert_eq!(config, ReconcileConfig::default());
}

#[test]
fn json_file_loads() {
    let file = write_temp(
        ".json",
        r#"{ "deadline_ms": 4000, "settle_rechecks": 2, "settle_interval_ms": 40 }"#,
    );
    let config = ReconcileConfig::from_json_file(file.path()).expect("valid policy");
    assert_eq!(config.deadline_duration(), Duration::from_secs(4));
    assert_eq!(config.settle_rechecks, 2);
    assert_eq!(config.settle_interval(), Duration::from_millis(40));
}

#[test]
fn invalid_values_are_rejected_after_parsing() {
    let err = ReconcileConfig::from_toml_str("max_snapshots = 0\ndeadline_ms = 100\n")
        .expect_err("zero budget and ack timeout above deadline");
    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 2, "{errors:?}");
            assert!(errors.iter().any(|e| e.contains("max_snapshots")));
            assert!(errors.iter().any(|e| e.contains("page_ack_timeout_ms")));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn malformed_input_reports_parser() {
    let err = ReconcileConfig::from_toml_str("max_snapshots = \"many\"").expect_err("bad type");
    assert!(matches!(err, ConfigError::Toml(_)));
    assert!(err.to_string().starts_with("TOML parse error"));

    let err = ReconcileConfig::from_json_str("{ not json").expect_err("bad syntax");
    assert!(matches!(err, ConfigError::Json(_)));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = ReconcileConfig::from_toml_file(dir.path().join("absent.toml"))
        .expect_err("file does not exist");
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn serialized_config_loads_back() {
    let config = ReconcileConfig::default()
        .max_snapshots(3)
        .highlight(Duration::from_millis(750));
    let json = serde_json::to_string(&config).expect("serialize");
    assert_eq!(ReconcileConfig::from_json_str(&json).expect("load"), config);
}
