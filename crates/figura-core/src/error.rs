// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Figura generation service.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Figura adapter traits and core operations.
#[derive(Debug, Error)]
pub enum FiguraError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, filesystem I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The 3D generation request itself was rejected or could not be delivered.
    ///
    /// Surfaced immediately; submissions are never retried.
    #[error("submission rejected: {message}")]
    Submission {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The 2D image model returned a non-success response or no image.
    #[error("image generation failed: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A status query referenced a job the 3D service does not know about.
    #[error("generation job {request_id} not found")]
    JobNotFound { request_id: String },

    /// The external job terminated in its `error` state.
    #[error("generation failed: {message}")]
    ServiceReported { request_id: String, message: String },

    /// The local retry budget ran out before the job reached a terminal state.
    ///
    /// The job may still be running on the external service.
    #[error("generation job {request_id} timed out after {attempts} polls ({elapsed:?})")]
    Timeout {
        request_id: String,
        attempts: u32,
        elapsed: Duration,
    },

    /// A `completed` status arrived without an artifact reference.
    #[error("inconsistent state for job {request_id}: {detail}")]
    InconsistentState { request_id: String, detail: String },

    /// A status query could not be completed (network failure, malformed body).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Missing, invalid, or expired credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but does not own the target resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A generation record does not exist.
    #[error("record {id} not found")]
    RecordNotFound { id: i64 },

    /// A uniqueness constraint was violated (duplicate username or email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller-supplied input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Polling stopped because the initiating context was torn down.
    #[error("polling for job {request_id} was cancelled")]
    Cancelled { request_id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FiguraError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FiguraError::Storage {
            source: Box::new(err),
        }
    }

    /// Whether the poller should keep polling after seeing this error from a
    /// status query. Only transport failures are absorbed by the retry budget.
    pub fn is_retryable_poll_error(&self) -> bool {
        matches!(self, FiguraError::Transport { .. })
    }

    /// Short machine-readable category, used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FiguraError::Config(_) => "config",
            FiguraError::Storage { .. } => "storage",
            FiguraError::Submission { .. } => "submission",
            FiguraError::Generation { .. } => "generation",
            FiguraError::JobNotFound { .. } => "job_not_found",
            FiguraError::ServiceReported { .. } => "service_reported",
            FiguraError::Timeout { .. } => "timeout",
            FiguraError::InconsistentState { .. } => "inconsistent_state",
            FiguraError::Transport { .. } => "transport",
            FiguraError::Unauthorized(_) => "unauthorized",
            FiguraError::Forbidden(_) => "forbidden",
            FiguraError::RecordNotFound { .. } => "record_not_found",
            FiguraError::Conflict(_) => "conflict",
            FiguraError::InvalidInput(_) => "invalid_input",
            FiguraError::Cancelled { .. } => "cancelled",
            FiguraError::Internal(_) => "internal",
        }
    }
}
