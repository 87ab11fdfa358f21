// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for the Figura service.
//!
//! Provides the SQLite model registry (users, bearer tokens, generation
//! records) with embedded migrations and a single-writer concurrency model
//! via `tokio-rusqlite`, plus the filesystem artifact store.

pub mod adapter;
pub mod artifacts;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use artifacts::FsArtifactStore;
pub use database::{format_timestamp, now_timestamp, Database};
