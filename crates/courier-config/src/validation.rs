// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as required provider credentials, URL schemes, and limit ordering.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(validation("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(validation(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if config.server.port == 0 {
        errors.push(validation("server.port must be between 1 and 65535"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty"));
    }

    match config.provider.base_url.as_deref().map(str::trim) {
        None | Some("") => errors.push(ConfigError::MissingKey {
            key: "provider.base_url".to_string(),
        }),
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            errors.push(validation(format!(
                "provider.base_url `{url}` must start with http:// or https://"
            )));
        }
        Some(_) => {}
    }

    if config
        .provider
        .api_token
        .as_deref()
        .is_none_or(|t| t.trim().is_empty())
    {
        errors.push(ConfigError::MissingKey {
            key: "provider.api_token".to_string(),
        });
    }

    for (key, secs) in [
        ("server.request_timeout_secs", config.server.request_timeout_secs),
        ("storage.call_timeout_secs", config.storage.call_timeout_secs),
        ("provider.call_timeout_secs", config.provider.call_timeout_secs),
    ] {
        if secs == 0 {
            errors.push(validation(format!("{key} must be at least 1")));
        }
    }

    if config.query.default_limit == 0 {
        errors.push(validation("query.default_limit must be at least 1"));
    }
    if config.query.default_limit > config.query.max_limit {
        errors.push(validation(format!(
            "query.default_limit ({}) must not exceed query.max_limit ({})",
            config.query.default_limit, config.query.max_limit
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
