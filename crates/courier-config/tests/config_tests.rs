// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Courier configuration system.

use courier_config::diagnostic::ConfigError;
use courier_config::model::CourierConfig;
use courier_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

const PROVIDER: &str = r#"
[provider]
base_url = "https://live-server.example.com"
api_token = "token-abc"
"#;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_courier_config() {
    let toml = r#"
[service]
name = "courier-test"
log_level = "debug"

[server]
host = "0.0.0.0"
port = 8080
request_timeout_secs = 5

[storage]
database_path = "/tmp/courier-test.db"
wal_mode = false
call_timeout_secs = 3

[provider]
base_url = "https://live-server.example.com"
api_token = "token-abc"
call_timeout_secs = 7

[query]
default_limit = 20
max_limit = 40

[prometheus]
enabled = true
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.service.name, "courier-test");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.request_timeout_secs, 5);
    assert_eq!(config.storage.database_path, "/tmp/courier-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.call_timeout().as_secs(), 3);
    assert_eq!(
        config.provider.base_url.as_deref(),
        Some("https://live-server.example.com")
    );
    assert_eq!(config.provider.api_token.as_deref(), Some("token-abc"));
    assert_eq!(config.provider.call_timeout().as_secs(), 7);
    assert_eq!(config.query.default_limit, 20);
    assert_eq!(config.query.max_limit, 40);
    assert!(config.prometheus.enabled);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.service.name, "courier");
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.storage.database_path, "courier.db");
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.call_timeout_secs, 10);
    assert!(config.provider.base_url.is_none());
    assert!(config.provider.api_token.is_none());
    assert_eq!(config.provider.call_timeout_secs, 15);
    assert_eq!(config.query.default_limit, 100);
    assert_eq!(config.query.max_limit, 500);
    assert!(!config.prometheus.enabled);
}

/// Startup without provider credentials is a fatal configuration error.
#[test]
fn missing_provider_credentials_are_reported_as_missing_keys() {
    let errors = load_and_validate_str("").expect_err("credentials are required");
    let keys: Vec<&str> = errors
        .iter()
        .filter_map(|e| match e {
            ConfigError::MissingKey { key } => Some(key.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(keys, vec!["provider.base_url", "provider.api_token"]);
}

/// Unknown field in [provider] produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_provider_key_suggests_correction() {
    let toml = r#"
[provider]
base_url = "https://live-server.example.com"
api_tokn = "abc"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { key, suggestion: Some(s), .. }
                if key == "api_tokn" && s == "api_token"
        )
    });
    assert!(found, "expected suggestion for api_tokn, got: {errors:?}");
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// A wrongly typed value is reported with the offending key path.
#[test]
fn wrong_type_reports_key_path() {
    let toml = format!("{PROVIDER}\n[server]\nport = \"eighty\"\n");
    let errors = load_and_validate_str(&toml).expect_err("port must be an integer");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key == "server.port")),
        "got: {errors:?}"
    );
}

/// Dot-notation overrides (as produced by the env mapping) win over TOML.
#[test]
fn dotted_override_replaces_toml_value() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: CourierConfig = Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string(PROVIDER))
        .merge(("provider.api_token", "from-env"))
        .extract()
        .expect("should merge override");

    assert_eq!(config.provider.api_token.as_deref(), Some("from-env"));
}

/// An explicit config file path is honoured.
#[test]
fn load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("courier.toml");
    std::fs::write(&path, format!("{PROVIDER}\n[server]\nport = 4100\n")).unwrap();

    let config = load_and_validate_path(&path).expect("file config should validate");
    assert_eq!(config.server.port, 4100);
    assert_eq!(config.provider.api_token.as_deref(), Some("token-abc"));
}

/// Debug output never leaks the provider token.
#[test]
fn provider_debug_redacts_token() {
    let config: CourierConfig = toml::from_str(PROVIDER).unwrap();
    let debug = format!("{:?}", config.provider);
    assert!(debug.contains("[redacted]"));
    assert!(!debug.contains("token-abc"));
}

/// Requested limits are clamped to the configured bounds.
#[test]
fn query_limit_is_clamped() {
    let config = CourierConfig::default();
    assert_eq!(config.query.effective_limit(None), 100);
    assert_eq!(config.query.effective_limit(Some(0)), 100);
    assert_eq!(config.query.effective_limit(Some(25)), 25);
    assert_eq!(config.query.effective_limit(Some(10_000)), 500);
}
