// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Freedom configuration system.

use freedom_config::diagnostic::ConfigError;
use freedom_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_freedom_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9090
log_level = "debug"

[storage]
database_path = "/tmp/freedom-test.db"
wal_mode = false

[pipeline]
lease_duration_secs = 120
attempt_timeout_secs = 60
scan_delay_per_item_secs = 0
propagate_spacing_secs = 1
poll_interval_ms = 50
concurrency = 8

[queue]
max_attempts = 3
backoff_base_secs = 1
backoff_max_secs = 30

[adapters]
archive_dir = "/srv/archive"
archive_page_size = 5
export_dir = "/srv/export"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/freedom-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.pipeline.lease_duration_secs, 120);
    assert_eq!(config.pipeline.concurrency, 8);
    assert_eq!(config.queue.max_attempts, 3);
    assert_eq!(config.adapters.archive_page_size, 5);
    assert_eq!(config.adapters.export_dir, "/srv/export");
}

/// Sections that are left out fall back to their defaults.
#[test]
fn partial_toml_keeps_defaults() {
    let config = load_config_from_str("[server]\nport = 1234\n").expect("should deserialize");
    assert_eq!(config.server.port, 1234);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.pipeline.lease_duration_secs, 720);
    assert_eq!(config.queue.max_attempts, 10);
}

#[test]
fn unknown_field_is_rejected_with_suggestion() {
    let toml = "[pipeline]\nconcurency = 2\n";
    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "concurency");
            assert_eq!(suggestion.as_deref(), Some("concurrency"));
            assert!(span.is_none(), "inline sources carry no file metadata");
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[telegram]\nbot_token = \"x\"\n")
        .expect_err("unknown section should fail");
    assert!(err.to_string().contains("telegram"));
}

#[test]
fn wrong_type_is_reported_with_key_path() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n")
        .expect_err("string port should fail");
    match &errors[0] {
        ConfigError::InvalidType { key, .. } => assert_eq!(key, "server.port"),
        other => panic!("expected InvalidType, got {other:?}"),
    }
}

#[test]
fn short_lease_fails_validation() {
    let toml = "[pipeline]\nlease_duration_secs = 30\nattempt_timeout_secs = 60\n";
    let errors = load_and_validate_str(toml).expect_err("lease shorter than attempt");
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("lease_duration_secs")));
}

#[test]
fn file_typo_gets_suggestion() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("freedom.toml");
    std::fs::write(&path, "[queue]\nmax_atempts = 3\n").expect("write config");

    let errors = load_and_validate_path(&path).expect_err("typo should fail");
    match &errors[0] {
        ConfigError::UnknownKey { key, suggestion, .. } => {
            assert_eq!(key, "max_atempts");
            assert_eq!(suggestion.as_deref(), Some("max_attempts"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = load_and_validate_path(&dir.path().join("absent.toml"))
        .expect("absent file is not an error");
    assert_eq!(config.server.port, 8080);
}
