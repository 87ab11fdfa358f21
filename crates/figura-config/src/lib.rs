// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Figura service.
//!
//! Settings come from compiled defaults, then `/etc/figura/figura.toml`,
//! the user's `figura/figura.toml` config file, `./figura.toml`, and finally
//! `FIGURA_*` environment variables. Unknown keys are rejected with a
//! miette diagnostic; semantic checks collect every problem at once.
//!
//! ```no_run
//! let config = match figura_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         figura_config::render_errors(&errors);
//!         std::process::exit(1);
//!     }
//! };
//! println!("3D service: {}", config.mesh.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

use diagnostic::ConfigSource;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::FiguraConfig;

/// Loads the layered configuration and validates it.
pub fn load_and_validate() -> Result<FiguraConfig, Vec<ConfigError>> {
    validated(loader::load_config(), || {
        standard_paths()
            .iter()
            .filter_map(|path| ConfigSource::read(path))
            .collect()
    })
}

/// Validates configuration given as a TOML string (plus env overrides).
pub fn load_and_validate_str(toml_content: &str) -> Result<FiguraConfig, Vec<ConfigError>> {
    validated(loader::load_config_from_str(toml_content), || {
        vec![ConfigSource::inline(toml_content)]
    })
}

/// Validates an explicit configuration file (plus env overrides).
pub fn load_and_validate_path(path: &Path) -> Result<FiguraConfig, Vec<ConfigError>> {
    validated(loader::load_config_from_path(path), || {
        ConfigSource::read(path).into_iter().collect()
    })
}

/// Runs semantic validation on a loaded config, or converts the load
/// failure into diagnostics. `sources` is only read on failure.
fn validated(
    loaded: Result<FiguraConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<ConfigSource>,
) -> Result<FiguraConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// The files the layered loader reads, by the names figment records.
fn standard_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/figura/figura.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("figura/figura.toml"));
    }
    // figment canonicalizes relative paths against the working directory.
    paths.push(
        std::env::current_dir()
            .map(|d| d.join("figura.toml"))
            .unwrap_or_else(|_| PathBuf::from("figura.toml")),
    );
    paths
}
