// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./figura.toml` > `~/.config/figura/figura.toml` > `/etc/figura/figura.toml`
//! with environment variable overrides via `FIGURA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FiguraConfig;

/// Config sections that may be targeted by `FIGURA_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "server", "logging", "storage", "artifacts", "auth", "image", "mesh",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/figura/figura.toml` (system-wide)
/// 3. `~/.config/figura/figura.toml` (user XDG config)
/// 4. `./figura.toml` (local directory)
/// 5. `FIGURA_*` environment variables
pub fn load_config() -> Result<FiguraConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FiguraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FiguraConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FiguraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FiguraConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FiguraConfig::default()))
        .merge(Toml::file("/etc/figura/figura.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("figura/figura.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("figura.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `FIGURA_MESH_POLL_INTERVAL_SECS` must map to
/// `mesh.poll_interval_secs`, not `mesh.poll.interval.secs`.
fn env_provider() -> Env {
    Env::prefixed("FIGURA_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
