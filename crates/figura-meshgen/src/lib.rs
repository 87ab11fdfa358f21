// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! 3D generation for Figura: the model generator service adapter and the
//! job status poller.
//!
//! [`MeshProvider`] implements [`MeshGenerator`] on top of
//! [`MeshServiceClient`]; [`poller::GenerationPoller`] turns a submitted
//! job into a reconciled registry entry.

pub mod client;
pub mod poller;
pub mod types;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, info, warn};

use figura_config::model::{MeshConfig, PrefixRewrite};
use figura_core::error::FiguraError;
use figura_core::media::sniff_image;
use figura_core::traits::{MeshGenerator, PluginAdapter};
use figura_core::types::{AdapterType, HealthStatus, JobReceipt, JobStatus, JobStatusReport};

pub use crate::client::MeshServiceClient;
pub use crate::poller::{
    GenerationPoller, NoopReconciler, PollOutcome, PollPolicy, PollState, Reconciler,
    RecordReconciler, TokioSleeper,
};
use crate::types::{GenerateRequest, ServiceResponse};

/// Model generator service adapter implementing [`MeshGenerator`].
pub struct MeshProvider {
    client: MeshServiceClient,
    rewrite: Option<PrefixRewrite>,
}

impl MeshProvider {
    /// Creates a provider for the service described by `config`.
    pub fn new(config: &MeshConfig) -> Result<Self, FiguraError> {
        let client = MeshServiceClient::new(config)?;
        info!(base_url = %client.base_url(), "model generator provider initialized");
        Ok(Self {
            client,
            rewrite: config.artifact_rewrite.clone(),
        })
    }

    fn to_report(&self, response: ServiceResponse) -> Result<JobStatusReport, FiguraError> {
        let status = parse_status(&response.status).ok_or_else(|| FiguraError::Transport {
            message: format!("unrecognized job status `{}`", response.status),
            source: None,
        })?;
        let model_url = match (&self.rewrite, response.model_url) {
            (Some(rewrite), Some(url)) if status == JobStatus::Completed => {
                Some(rewrite.apply(&url))
            }
            (_, url) => url,
        };
        Ok(JobStatusReport {
            status,
            message: response.message,
            model_url,
        })
    }
}

fn parse_status(raw: &str) -> Option<JobStatus> {
    raw.trim().to_ascii_lowercase().parse().ok()
}

#[async_trait]
impl PluginAdapter for MeshProvider {
    fn name(&self) -> &str {
        "model-generator"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MeshGenerator
    }

    async fn health_check(&self) -> Result<HealthStatus, FiguraError> {
        match self.client.ping().await {
            Ok(status) if status.is_success() => Ok(HealthStatus::Healthy),
            Ok(status) => Ok(HealthStatus::Degraded(format!(
                "model generator answered {status}"
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), FiguraError> {
        Ok(())
    }
}

#[async_trait]
impl MeshGenerator for MeshProvider {
    async fn submit(&self, image: &[u8]) -> Result<JobReceipt, FiguraError> {
        let kind = sniff_image(image)?;
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!(request_id = %request_id, format = kind.extension, bytes = image.len(), "submitting image");

        let response = self
            .client
            .generate(&GenerateRequest {
                id: request_id.clone(),
                image: BASE64.encode(image),
            })
            .await?;

        let status = parse_status(&response.status)
            .filter(|s| s.is_accepted())
            .ok_or_else(|| FiguraError::Submission {
                message: response
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("service answered status `{}`", response.status)),
                source: None,
            })?;

        // Status queries use the id we generated, whatever the service echoes.
        if let Some(echoed) = response.request_id.as_deref().filter(|echoed| *echoed != request_id) {
            warn!(request_id = %request_id, echoed, "service echoed a different request id");
        }
        info!(request_id = %request_id, status = %status, "3D job submitted");
        Ok(JobReceipt { request_id, status })
    }

    async fn get_status(&self, request_id: &str) -> Result<JobStatusReport, FiguraError> {
        let response = self.client.status(request_id).await?;
        self.to_report(response)
    }

    async fn fetch_artifact(&self, model_url: &str) -> Result<Vec<u8>, FiguraError> {
        self.client.download(model_url).await
    }
}
