// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-empty paths, well-formed URLs and a
//! non-zero polling budget.

use crate::diagnostic::ConfigError;
use crate::model::FiguraConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FiguraConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_server(config, &mut errors);
    validate_paths(config, &mut errors);
    validate_auth(config, &mut errors);
    validate_image(config, &mut errors);
    validate_mesh(config, &mut errors);

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` must be one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_server(config: &FiguraConfig, errors: &mut Vec<ConfigError>) {
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.server.max_upload_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "server.max_upload_bytes must be greater than 0".to_string(),
        });
    }
}

fn validate_paths(config: &FiguraConfig, errors: &mut Vec<ConfigError>) {
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.artifacts.root.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "artifacts.root must not be empty".to_string(),
        });
    }

    let prefix = &config.artifacts.public_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ConfigError::Validation {
            message: format!(
                "artifacts.public_prefix `{prefix}` must start with `/`, be non-root, and not end with `/`"
            ),
        });
    }
}

fn validate_auth(config: &FiguraConfig, errors: &mut Vec<ConfigError>) {
    let auth = &config.auth;

    if auth.token_ttl_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "auth.token_ttl_minutes must be greater than 0".to_string(),
        });
    }

    // Argon2 lower bound: 8 KiB per lane.
    if auth.password_memory_kib < 8 * auth.password_parallelism.max(1) {
        errors.push(ConfigError::Validation {
            message: format!(
                "auth.password_memory_kib must be at least 8 KiB per lane, got {}",
                auth.password_memory_kib
            ),
        });
    }

    if auth.password_iterations < 1 {
        errors.push(ConfigError::Validation {
            message: "auth.password_iterations must be at least 1".to_string(),
        });
    }

    if auth.password_parallelism < 1 {
        errors.push(ConfigError::Validation {
            message: "auth.password_parallelism must be at least 1".to_string(),
        });
    }
}

fn validate_image(config: &FiguraConfig, errors: &mut Vec<ConfigError>) {
    if !is_http_url(&config.image.base_url) {
        errors.push(ConfigError::Validation {
            message: format!(
                "image.base_url `{}` must be an http(s) URL",
                config.image.base_url
            ),
        });
    }

    if config.image.model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "image.model must not be empty".to_string(),
        });
    }

    if config.image.default_instruction.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "image.default_instruction must not be empty".to_string(),
        });
    }

    if config.image.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "image.timeout_secs must be greater than 0".to_string(),
        });
    }
}

fn validate_mesh(config: &FiguraConfig, errors: &mut Vec<ConfigError>) {
    let mesh = &config.mesh;

    if !is_http_url(&mesh.base_url) {
        errors.push(ConfigError::Validation {
            message: format!("mesh.base_url `{}` must be an http(s) URL", mesh.base_url),
        });
    }

    if mesh.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "mesh.poll_interval_secs must be greater than 0".to_string(),
        });
    }

    if mesh.max_poll_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "mesh.max_poll_attempts must be greater than 0".to_string(),
        });
    }

    if mesh.submit_timeout_secs == 0 || mesh.status_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "mesh.submit_timeout_secs and mesh.status_timeout_secs must be greater than 0"
                .to_string(),
        });
    }

    if let Some(rewrite) = &mesh.artifact_rewrite
        && rewrite.from.is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "mesh.artifact_rewrite.from must not be empty".to_string(),
        });
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    matches!(rest, Some(host) if !host.is_empty())
}
