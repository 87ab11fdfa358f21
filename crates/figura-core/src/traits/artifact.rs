// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact store trait for uploaded and generated binaries.

use async_trait::async_trait;

use crate::error::FiguraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ArtifactKind, ArtifactRef};

/// Persists blobs and hands back stable references to them.
#[async_trait]
pub trait ArtifactStore: PluginAdapter {
    /// Stores `bytes` under a fresh name with the given file extension.
    async fn put(
        &self,
        kind: ArtifactKind,
        bytes: &[u8],
        extension: &str,
    ) -> Result<ArtifactRef, FiguraError>;

    /// Reads back a previously stored artifact.
    async fn get(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, FiguraError>;

    /// Removes an artifact. Removing a missing artifact is not an error.
    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), FiguraError>;

    /// Whether the reference points at an artifact held by this store.
    async fn exists(&self, artifact: &ArtifactRef) -> Result<bool, FiguraError>;
}
