// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status polling for submitted 3D generation jobs.
//!
//! A [`GenerationPoller`] drives one job from `Submitted` to a terminal
//! [`PollState`], publishing every transition on a `watch` channel owned by
//! the caller. Completion is reconciled into the registry exactly once
//! through a [`Reconciler`].
//!
//! Budget: at most `max_attempts` status queries, each preceded by a sleep
//! of `interval`. Transport failures consume an attempt but are not terminal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use figura_config::model::MeshConfig;
use figura_core::types::{ArtifactKind, ArtifactRef, JobStatus, RecordId};
use figura_core::{ArtifactStore, FiguraError, MeshGenerator, Sleeper, StorageAdapter};

/// Polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(2),
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &MeshConfig) -> Self {
        Self {
            max_attempts: config.max_poll_attempts,
            interval: Duration::from_secs(config.poll_interval_secs),
        }
    }

    /// Wall-clock budget the policy allows for.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Real-time sleeper backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Observable state of a polled job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollState {
    Submitted,
    Polling { attempts: u32 },
    Completed { model_url: String },
    Failed { message: String },
    TimedOut { attempts: u32 },
    Cancelled { attempts: u32 },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Submitted | PollState::Polling { .. })
    }
}

/// Result of a job that completed and was reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub request_id: String,
    /// URL reported by the service.
    pub model_url: String,
    /// Reference written to the registry.
    pub artifact: ArtifactRef,
    pub attempts: u32,
}

/// Applies a completed job's result to wherever it belongs.
#[async_trait]
pub trait Reconciler: Send + Sync {
    async fn reconcile(&self, request_id: &str, model_url: &str)
    -> Result<ArtifactRef, FiguraError>;
}

/// Reconciler for callers with no registry record, such as the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReconciler;

#[async_trait]
impl Reconciler for NoopReconciler {
    async fn reconcile(
        &self,
        _request_id: &str,
        model_url: &str,
    ) -> Result<ArtifactRef, FiguraError> {
        Ok(ArtifactRef(model_url.to_string()))
    }
}

/// Writes `generated_3d_ref` of one record.
///
/// With a mirror configured, the mesh is first copied into the artifact
/// store and the local reference is recorded instead of the service URL.
pub struct RecordReconciler {
    storage: Arc<dyn StorageAdapter>,
    record_id: RecordId,
    mirror: Option<Mirror>,
}

struct Mirror {
    generator: Arc<dyn MeshGenerator>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl RecordReconciler {
    pub fn new(storage: Arc<dyn StorageAdapter>, record_id: RecordId) -> Self {
        Self {
            storage,
            record_id,
            mirror: None,
        }
    }

    pub fn with_mirror(
        mut self,
        generator: Arc<dyn MeshGenerator>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        self.mirror = Some(Mirror {
            generator,
            artifacts,
        });
        self
    }

    async fn mirrored(&self, request_id: &str, model_url: &str) -> ArtifactRef {
        let remote = ArtifactRef(model_url.to_string());
        let Some(mirror) = &self.mirror else {
            return remote;
        };

        let stored = match mirror.generator.fetch_artifact(model_url).await {
            Ok(bytes) => {
                mirror
                    .artifacts
                    .put(ArtifactKind::Mesh, &bytes, mesh_extension(model_url))
                    .await
            }
            Err(e) => Err(e),
        };

        match stored {
            Ok(local) => local,
            Err(e) => {
                warn!(request_id, model_url, error = %e, "mesh mirroring failed, keeping service URL");
                remote
            }
        }
    }
}

#[async_trait]
impl Reconciler for RecordReconciler {
    async fn reconcile(
        &self,
        request_id: &str,
        model_url: &str,
    ) -> Result<ArtifactRef, FiguraError> {
        let artifact = self.mirrored(request_id, model_url).await;
        let changed = self
            .storage
            .attach_generated_3d(self.record_id, &artifact)
            .await?;
        info!(
            request_id,
            record_id = %self.record_id,
            artifact = %artifact,
            changed,
            "generated_3d_ref reconciled"
        );
        Ok(artifact)
    }
}

fn mesh_extension(model_url: &str) -> &str {
    let name = model_url.rsplit('/').next().unwrap_or(model_url);
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => ext,
        _ => "glb",
    }
}

/// Polls one job at a time against a [`MeshGenerator`].
#[derive(Clone)]
pub struct GenerationPoller {
    generator: Arc<dyn MeshGenerator>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
}

impl GenerationPoller {
    pub fn new(
        generator: Arc<dyn MeshGenerator>,
        sleeper: Arc<dyn Sleeper>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            generator,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Polls `request_id` until it reaches a terminal state.
    ///
    /// Returns the reconciled outcome on completion. Service-reported
    /// failures, exhausted budgets, unknown jobs, rejected credentials and
    /// cancellation are returned as errors; `state` always ends terminal.
    pub async fn run(
        &self,
        request_id: &str,
        reconciler: &dyn Reconciler,
        state: &watch::Sender<PollState>,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, FiguraError> {
        state.send_replace(PollState::Polling { attempts: 0 });
        let mut completed_without_url = false;

        for attempt in 1..=self.policy.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(request_id, attempt - 1, state)),
                _ = self.sleeper.sleep(self.policy.interval) => {}
            }

            state.send_replace(PollState::Polling { attempts: attempt });

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(request_id, attempt - 1, state)),
                status = self.generator.get_status(request_id) => status,
            };
            let report = match status {
                Ok(report) => report,
                Err(e) if e.is_retryable_poll_error() => {
                    warn!(request_id, attempt, error = %e, "status query failed, will retry");
                    continue;
                }
                Err(e) => {
                    warn!(request_id, attempt, error = %e, "polling stopped");
                    state.send_replace(PollState::Failed {
                        message: e.to_string(),
                    });
                    return Err(e);
                }
            };

            debug!(request_id, attempt, status = %report.status, "status observed");

            match report.status {
                JobStatus::Queued | JobStatus::Processing => {
                    completed_without_url = false;
                }
                JobStatus::Completed => {
                    let model_url = report.model_url.filter(|u| !u.trim().is_empty());
                    let Some(model_url) = model_url else {
                        let inconsistency = FiguraError::InconsistentState {
                            request_id: request_id.to_string(),
                            detail: "status completed without model_url".to_string(),
                        };
                        warn!(request_id, attempt, error = %inconsistency, "inconsistent job state");
                        if completed_without_url {
                            return Err(self.timed_out(request_id, attempt, state));
                        }
                        completed_without_url = true;
                        continue;
                    };

                    // A cancel mid-reconcile can leave the record without
                    // the model; the service still holds the result.
                    let reconciled = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(cancelled(request_id, attempt, state)),
                        reconciled = reconciler.reconcile(request_id, &model_url) => reconciled,
                    };
                    let artifact = match reconciled {
                        Ok(artifact) => artifact,
                        Err(e) => {
                            state.send_replace(PollState::Failed {
                                message: e.to_string(),
                            });
                            return Err(e);
                        }
                    };
                    info!(request_id, attempts = attempt, model_url = %model_url, "generation completed");
                    state.send_replace(PollState::Completed {
                        model_url: model_url.clone(),
                    });
                    return Ok(PollOutcome {
                        request_id: request_id.to_string(),
                        model_url,
                        artifact,
                        attempts: attempt,
                    });
                }
                JobStatus::Error => {
                    let message = report
                        .message
                        .unwrap_or_else(|| "unknown error".to_string());
                    warn!(request_id, attempt, message = %message, "generation failed on service");
                    state.send_replace(PollState::Failed {
                        message: message.clone(),
                    });
                    return Err(FiguraError::ServiceReported {
                        request_id: request_id.to_string(),
                        message,
                    });
                }
            }
        }

        Err(self.timed_out(request_id, self.policy.max_attempts, state))
    }

    fn timed_out(
        &self,
        request_id: &str,
        attempts: u32,
        state: &watch::Sender<PollState>,
    ) -> FiguraError {
        warn!(request_id, attempts, "generation timed out");
        state.send_replace(PollState::TimedOut { attempts });
        FiguraError::Timeout {
            request_id: request_id.to_string(),
            attempts,
            elapsed: self.policy.interval * attempts,
        }
    }
}

fn cancelled(request_id: &str, attempts: u32, state: &watch::Sender<PollState>) -> FiguraError {
    info!(request_id, attempts, "polling cancelled");
    state.send_replace(PollState::Cancelled { attempts });
    FiguraError::Cancelled {
        request_id: request_id.to_string(),
    }
}
