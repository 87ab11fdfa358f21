// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generator doubles for deterministic testing.
//!
//! `ScriptedMeshGenerator` implements `MeshGenerator` with per-job status
//! scripts; `MockImageGenerator` implements `ImageGenerator` with canned
//! images. Both count their calls for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use figura_core::traits::{ImageGenerator, MeshGenerator, PluginAdapter};
use figura_core::types::{
    AdapterType, HealthStatus, ImagePayload, ImageRequest, JobReceipt, JobStatus, JobStatusReport,
};
use figura_core::FiguraError;

use crate::PNG_BYTES;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// One scripted answer to a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusStep {
    Report(JobStatusReport),
    /// The query fails as a transport error.
    TransportFailure(String),
    /// The service does not know the job.
    NotFound,
}

impl StatusStep {
    pub fn queued() -> Self {
        StatusStep::Report(JobStatusReport::queued())
    }

    pub fn processing() -> Self {
        StatusStep::Report(JobStatusReport::processing())
    }

    pub fn completed(model_url: impl Into<String>) -> Self {
        StatusStep::Report(JobStatusReport::completed(model_url))
    }

    pub fn error(message: impl Into<String>) -> Self {
        StatusStep::Report(JobStatusReport::error(message))
    }

    fn answer(self, request_id: &str) -> Result<JobStatusReport, FiguraError> {
        match self {
            StatusStep::Report(report) => Ok(report),
            StatusStep::TransportFailure(message) => Err(FiguraError::Transport {
                message,
                source: None,
            }),
            StatusStep::NotFound => Err(FiguraError::JobNotFound {
                request_id: request_id.to_string(),
            }),
        }
    }
}

/// A 3D service double.
///
/// Status scripts are consumed front to back; the last step repeats forever,
/// so `[processing]` describes a job that never finishes. Unscripted jobs are
/// unknown to the service.
#[derive(Debug)]
pub struct ScriptedMeshGenerator {
    scripts: Mutex<HashMap<String, VecDeque<StatusStep>>>,
    request_ids: Mutex<VecDeque<String>>,
    submit_failure: Mutex<Option<String>>,
    submitted: Mutex<Vec<Vec<u8>>>,
    status_calls: Mutex<HashMap<String, u32>>,
    fetched: Mutex<Vec<String>>,
    artifact: Vec<u8>,
}

impl Default for ScriptedMeshGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedMeshGenerator {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            request_ids: Mutex::new(VecDeque::new()),
            submit_failure: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            status_calls: Mutex::new(HashMap::new()),
            fetched: Mutex::new(Vec::new()),
            artifact: b"glTF scripted mesh".to_vec(),
        }
    }

    /// Sets the status script for `request_id`, replacing any earlier one.
    pub fn script(&self, request_id: &str, steps: impl IntoIterator<Item = StatusStep>) {
        lock(&self.scripts).insert(request_id.to_string(), steps.into_iter().collect());
    }

    /// Queues the id the next submission will receive.
    pub fn next_request_id(&self, request_id: &str) {
        lock(&self.request_ids).push_back(request_id.to_string());
    }

    /// Makes every following submission fail with `message`.
    pub fn reject_submissions(&self, message: &str) {
        *lock(&self.submit_failure) = Some(message.to_string());
    }

    pub fn submit_calls(&self) -> usize {
        lock(&self.submitted).len()
    }

    pub fn submitted_images(&self) -> Vec<Vec<u8>> {
        lock(&self.submitted).clone()
    }

    pub fn status_calls(&self, request_id: &str) -> u32 {
        lock(&self.status_calls)
            .get(request_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        lock(&self.fetched).clone()
    }

    fn next_step(&self, request_id: &str) -> Option<StatusStep> {
        let mut scripts = lock(&self.scripts);
        let steps = scripts.get_mut(request_id)?;
        if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        }
    }
}

#[async_trait]
impl PluginAdapter for ScriptedMeshGenerator {
    fn name(&self) -> &str {
        "scripted-mesh"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MeshGenerator
    }

    async fn health_check(&self) -> Result<HealthStatus, FiguraError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FiguraError> {
        Ok(())
    }
}

#[async_trait]
impl MeshGenerator for ScriptedMeshGenerator {
    async fn submit(&self, image: &[u8]) -> Result<JobReceipt, FiguraError> {
        let count = {
            let mut submitted = lock(&self.submitted);
            submitted.push(image.to_vec());
            submitted.len()
        };
        if let Some(message) = lock(&self.submit_failure).clone() {
            return Err(FiguraError::Submission {
                message,
                source: None,
            });
        }
        let request_id = lock(&self.request_ids)
            .pop_front()
            .unwrap_or_else(|| format!("scripted-{count}"));
        Ok(JobReceipt {
            request_id,
            status: JobStatus::Queued,
        })
    }

    async fn get_status(&self, request_id: &str) -> Result<JobStatusReport, FiguraError> {
        *lock(&self.status_calls)
            .entry(request_id.to_string())
            .or_insert(0) += 1;
        match self.next_step(request_id) {
            Some(step) => step.answer(request_id),
            None => Err(FiguraError::JobNotFound {
                request_id: request_id.to_string(),
            }),
        }
    }

    async fn fetch_artifact(&self, model_url: &str) -> Result<Vec<u8>, FiguraError> {
        lock(&self.fetched).push(model_url.to_string());
        Ok(self.artifact.clone())
    }
}

/// A 2D generator double.
///
/// Answers with queued outputs first and a small PNG afterwards.
#[derive(Debug, Default)]
pub struct MockImageGenerator {
    outputs: Mutex<VecDeque<Result<ImagePayload, String>>>,
    requests: Mutex<Vec<ImageRequest>>,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_image(&self, bytes: &[u8], mime_type: &str) {
        lock(&self.outputs).push_back(Ok(ImagePayload {
            bytes: bytes.to_vec(),
            mime_type: mime_type.to_string(),
        }));
    }

    /// Queues a failure surfaced as a generation error.
    pub fn push_failure(&self, message: &str) {
        lock(&self.outputs).push_back(Err(message.to_string()));
    }

    pub fn requests(&self) -> Vec<ImageRequest> {
        lock(&self.requests).clone()
    }

    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl PluginAdapter for MockImageGenerator {
    fn name(&self) -> &str {
        "mock-image"
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
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, request: ImageRequest) -> Result<ImagePayload, FiguraError> {
        lock(&self.requests).push(request);
        let next = lock(&self.outputs).pop_front();
        match next {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(message)) => Err(FiguraError::Generation {
                message,
                source: None,
            }),
            None => Ok(ImagePayload {
                bytes: PNG_BYTES.to_vec(),
                mime_type: "image/png".to_string(),
            }),
        }
    }
}
