// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! 2D figure generation for Figura.
//!
//! [`GeminiImageClient`] implements [`ImageGenerator`] against the
//! `generateContent` endpoint with image-only output. [`generate_2d`]
//! composes the prompt, calls a generator, and stores the result.

pub mod generate;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, info};

use figura_config::model::ImageConfig;
use figura_core::error::FiguraError;
use figura_core::traits::{ImageGenerator, PluginAdapter};
use figura_core::types::{AdapterType, HealthStatus, ImagePayload, ImageRequest};

pub use crate::generate::{build_prompt, generate_2d, resolve_instructions};
use crate::types::{
    ApiErrorResponse, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Part,
};

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Image model client implementing [`ImageGenerator`].
///
/// API key resolution order: `image.api_key` -> `GEMINI_API_KEY` -> error.
#[derive(Debug, Clone)]
pub struct GeminiImageClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiImageClient {
    pub fn new(config: &ImageConfig) -> Result<Self, FiguraError> {
        let api_key = resolve_api_key(&config.api_key)?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&api_key)
            .map_err(|e| FiguraError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FiguraError::Internal(format!("failed to build HTTP client: {e}")))?;

        info!(model = %config.model, "image generator initialized");
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.trim_start_matches("models/").to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

fn resolve_api_key(configured: &Option<String>) -> Result<String, FiguraError> {
    if let Some(key) = configured.as_ref().filter(|k| !k.is_empty()) {
        return Ok(key.clone());
    }
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(FiguraError::Config(format!(
            "no image API key: set image.api_key or {API_KEY_ENV}"
        ))),
    }
}

fn generation_error(message: String) -> FiguraError {
    FiguraError::Generation {
        message,
        source: None,
    }
}

#[async_trait]
impl PluginAdapter for GeminiImageClient {
    fn name(&self) -> &str {
        "gemini-image"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ImageGenerator
    }

    async fn health_check(&self) -> Result<HealthStatus, FiguraError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FiguraError> {
        Ok(())
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    async fn generate(&self, request: ImageRequest) -> Result<ImagePayload, FiguraError> {
        let mut parts = vec![Part::text(request.prompt)];
        if let Some(reference) = &request.reference {
            parts.push(Part::inline(
                reference.mime_type.clone(),
                BASE64.encode(&reference.bytes),
            ));
        }
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig::image_only(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| FiguraError::Generation {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "image response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api) => format!(
                    "image API error ({}): {}",
                    api.error.status.unwrap_or_else(|| status.to_string()),
                    api.error.message
                ),
                Err(_) => format!("image API returned {status}: {body}"),
            };
            return Err(generation_error(message));
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| FiguraError::Generation {
                message: format!("failed to parse image response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let inline = parsed
            .first_inline_data()
            .ok_or_else(|| generation_error("no image generated".to_string()))?;
        let bytes = BASE64
            .decode(inline.data.as_bytes())
            .map_err(|e| FiguraError::Generation {
                message: format!("image payload is not valid base64: {e}"),
                source: Some(Box::new(e)),
            })?;
        let mime_type = if inline.mime_type.is_empty() {
            "image/png".to_string()
        } else {
            inline.mime_type.clone()
        };

        Ok(ImagePayload { bytes, mime_type })
    }
}
