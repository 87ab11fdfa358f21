// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mesh generator trait for the asynchronous 3D generation service.

use async_trait::async_trait;

use crate::error::FiguraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{JobReceipt, JobStatusReport};

/// Adapter for an asynchronous, queue-based image-to-mesh service.
#[async_trait]
pub trait MeshGenerator: PluginAdapter {
    /// Submits an image for generation under a freshly generated request id.
    ///
    /// Fails with [`FiguraError::Submission`] if the service is unreachable or
    /// rejects the payload. Never retried.
    async fn submit(&self, image: &[u8]) -> Result<JobReceipt, FiguraError>;

    /// Queries the current status of a submitted job.
    ///
    /// Unknown ids fail with [`FiguraError::JobNotFound`].
    async fn get_status(&self, request_id: &str) -> Result<JobStatusReport, FiguraError>;

    /// Downloads a generated artifact by the URL a completed job reported.
    async fn fetch_artifact(&self, model_url: &str) -> Result<Vec<u8>, FiguraError>;
}
