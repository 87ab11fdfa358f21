// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Figura generation service.
//!
//! This crate provides the error taxonomy, domain types, and adapter traits
//! shared by every other crate in the workspace. Storage, generators, and
//! authentication are all consumed through the traits defined here.

pub mod error;
pub mod media;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FiguraError;
pub use types::{
    AdapterType, ArtifactKind, ArtifactRef, GenerationRecord, HealthStatus, JobReceipt,
    JobStatus, JobStatusReport, RecordId, UserId,
};

pub use traits::{
    ArtifactStore, AuthAdapter, ImageGenerator, MeshGenerator, PluginAdapter, Sleeper,
    StorageAdapter,
};
