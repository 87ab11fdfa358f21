// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `figura config`: the effective configuration as TOML.

use figura_config::model::FiguraConfig;
use figura_core::FiguraError;

const REDACTED: &str = "[redacted]";

/// Secret keys, as `(section, key)`.
const SECRETS: &[(&str, &str)] = &[("image", "api_key"), ("mesh", "token")];

/// Renders `config` as TOML with every secret replaced by `[redacted]`.
pub fn render(config: &FiguraConfig) -> Result<String, FiguraError> {
    let mut value = toml::Value::try_from(config)
        .map_err(|e| FiguraError::Internal(format!("failed to serialize config: {e}")))?;

    for (section, key) in SECRETS {
        if let Some(secret) = value
            .get_mut(*section)
            .and_then(|section| section.get_mut(*key))
        {
            *secret = toml::Value::String(REDACTED.to_string());
        }
    }

    toml::to_string_pretty(&value)
        .map_err(|e| FiguraError::Internal(format!("failed to render config: {e}")))
}
