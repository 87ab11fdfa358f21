// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod artifact;
pub mod auth;
pub mod image;
pub mod mesh;
pub mod sleeper;
pub mod storage;

pub use adapter::PluginAdapter;
pub use artifact::ArtifactStore;
pub use auth::AuthAdapter;
pub use image::ImageGenerator;
pub use mesh::MeshGenerator;
pub use sleeper::Sleeper;
pub use storage::StorageAdapter;
