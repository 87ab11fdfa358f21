// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types of the model generator service.

use serde::{Deserialize, Serialize};

/// Body of `POST /generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Caller-chosen request id, echoed back by the service.
    pub id: String,
    /// Base64-encoded raster image.
    pub image: String,
}

/// Body returned by both `POST /generate` and `GET /status/{id}`.
///
/// `status` is kept as a raw string so an unexpected value can be reported
/// verbatim instead of surfacing as a decode error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model_url: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Error body of a non-2xx response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceErrorBody {
    /// Best human-readable description carried by the body.
    pub fn description(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => self.message.clone(),
        }
    }
}
