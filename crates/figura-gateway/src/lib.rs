// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the Figura generation service.
//!
//! The gateway exposes accounts, the model registry, 2D and 3D generation,
//! job progress, and the static artifact tree over axum. Submitted 3D jobs
//! are polled in background tasks owned by a [`JobTracker`]; every poller
//! descends from the server's shutdown token.

pub mod auth;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod jobs;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use jobs::{JobTracker, JobView, TrackedJob};
pub use server::{build_router, start_server, GatewayState};
