// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed artifact store.
//!
//! Artifacts live at `<root>/<kind>/<uuid>.<ext>` and are referenced as
//! `<public_prefix>/<kind>/<uuid>.<ext>`, which is also the URL path the
//! gateway serves them under.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use tracing::debug;

use figura_config::model::ArtifactsConfig;
use figura_core::{
    AdapterType, ArtifactKind, ArtifactRef, ArtifactStore, FiguraError, HealthStatus,
    PluginAdapter,
};

/// Artifact store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    public_prefix: String,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ArtifactsConfig) -> Self {
        Self::new(&config.root, &config.public_prefix)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// Map a reference back to its file, rejecting anything that does not
    /// name a file directly inside one of the kind directories.
    fn resolve(&self, artifact: &ArtifactRef) -> Result<PathBuf, FiguraError> {
        let invalid = || FiguraError::InvalidInput(format!("not a stored artifact: {artifact}"));

        let rest = artifact
            .as_str()
            .strip_prefix(&self.public_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(invalid)?;
        let (kind, name) = rest.split_once('/').ok_or_else(invalid)?;
        let kind = ArtifactKind::from_str(kind).map_err(|_| invalid())?;

        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(invalid());
        }
        Ok(self.root.join(kind.to_string()).join(name))
    }
}

fn io_error(err: std::io::Error) -> FiguraError {
    FiguraError::storage(err)
}

#[async_trait]
impl PluginAdapter for FsArtifactStore {
    fn name(&self) -> &str {
        "fs-artifacts"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ArtifactStore
    }

    async fn health_check(&self) -> Result<HealthStatus, FiguraError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(_) => Ok(HealthStatus::Degraded(format!(
                "{} does not exist yet",
                self.root.display()
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), FiguraError> {
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(
        &self,
        kind: ArtifactKind,
        bytes: &[u8],
        extension: &str,
    ) -> Result<ArtifactRef, FiguraError> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(FiguraError::InvalidInput(format!(
                "invalid artifact extension `{extension}`"
            )));
        }

        let dir = self.root.join(kind.to_string());
        tokio::fs::create_dir_all(&dir).await.map_err(io_error)?;

        let name = format!("{}.{extension}", uuid::Uuid::new_v4());
        let path = dir.join(&name);
        tokio::fs::write(&path, bytes).await.map_err(io_error)?;

        debug!(path = %path.display(), bytes = bytes.len(), "artifact stored");
        Ok(ArtifactRef(format!("{}/{kind}/{name}", self.public_prefix)))
    }

    async fn get(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, FiguraError> {
        let path = self.resolve(artifact)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FiguraError::InvalidInput(
                format!("artifact {artifact} does not exist"),
            )),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), FiguraError> {
        let path = self.resolve(artifact)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn exists(&self, artifact: &ArtifactRef) -> Result<bool, FiguraError> {
        let path = match self.resolve(artifact) {
            Ok(path) => path,
            Err(_) => return Ok(false),
        };
        tokio::fs::try_exists(&path).await.map_err(io_error)
    }
}
