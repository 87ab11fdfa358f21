// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the registry, artifact store, accounts and
//! generator doubles over a temp directory. The gateway and CLI tests build
//! their own entry points on top of these parts.

use std::sync::Arc;
use std::time::Duration;

use figura_auth::Accounts;
use figura_config::model::{ArtifactsConfig, AuthConfig, FiguraConfig, StorageConfig};
use figura_core::types::User;
use figura_core::{ArtifactStore, FiguraError, StorageAdapter};
use figura_meshgen::{GenerationPoller, PollPolicy};
use figura_storage::{FsArtifactStore, SqliteStorage};

use crate::mock_generators::{MockImageGenerator, ScriptedMeshGenerator};
use crate::sleeper::InstantSleeper;

/// Password used for every account created through the harness.
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    policy: PollPolicy,
    mirror_artifacts: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            policy: PollPolicy {
                max_attempts: 10,
                interval: Duration::from_secs(2),
            },
            mirror_artifacts: false,
        }
    }

    /// Set the polling budget.
    pub fn with_poll_policy(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.policy = PollPolicy {
            max_attempts,
            interval,
        };
        self
    }

    /// Copy completed meshes into the artifact store.
    pub fn with_mirrored_artifacts(mut self) -> Self {
        self.mirror_artifacts = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, FiguraError> {
        let temp_dir = tempfile::TempDir::new().map_err(FiguraError::storage)?;

        let mut config = FiguraConfig::default();
        config.storage = StorageConfig {
            database_path: temp_dir
                .path()
                .join("figura-test.db")
                .to_string_lossy()
                .into_owned(),
            wal_mode: true,
        };
        config.artifacts = ArtifactsConfig {
            root: temp_dir
                .path()
                .join("uploads")
                .to_string_lossy()
                .into_owned(),
            public_prefix: "/uploads".to_string(),
        };
        // Cheapest argon2 parameters the validator accepts.
        config.auth = AuthConfig {
            password_memory_kib: 64,
            password_iterations: 1,
            password_parallelism: 1,
            ..AuthConfig::default()
        };
        config.mesh.max_poll_attempts = self.policy.max_attempts;
        config.mesh.poll_interval_secs = self.policy.interval.as_secs();
        config.mesh.mirror_artifacts = self.mirror_artifacts;

        let sqlite = SqliteStorage::new(config.storage.clone());
        sqlite.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(sqlite);
        let artifacts = Arc::new(FsArtifactStore::from_config(&config.artifacts));
        let accounts = Arc::new(Accounts::new(storage.clone(), config.auth.clone()));

        Ok(TestHarness {
            storage,
            artifacts,
            accounts,
            mesh: Arc::new(ScriptedMeshGenerator::new()),
            images: Arc::new(MockImageGenerator::new()),
            sleeper: Arc::new(InstantSleeper::new()),
            policy: self.policy,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with generator doubles and temp storage.
pub struct TestHarness {
    /// SQLite registry (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    /// Artifact store rooted in the temp directory.
    pub artifacts: Arc<FsArtifactStore>,
    pub accounts: Arc<Accounts>,
    pub mesh: Arc<ScriptedMeshGenerator>,
    pub images: Arc<MockImageGenerator>,
    pub sleeper: Arc<InstantSleeper>,
    pub policy: PollPolicy,
    /// Configuration matching the parts above.
    pub config: FiguraConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A poller over the scripted 3D service and the instant sleeper.
    pub fn poller(&self) -> GenerationPoller {
        GenerationPoller::new(self.mesh.clone(), self.sleeper.clone(), self.policy)
    }

    pub fn artifact_store(&self) -> Arc<dyn ArtifactStore> {
        self.artifacts.clone()
    }

    /// Registers `username` and logs in, returning the user and a bearer token.
    pub async fn sign_up(&self, username: &str) -> Result<(User, String), FiguraError> {
        let email = format!("{username}@example.com");
        let user = self
            .accounts
            .register(username, &email, TEST_PASSWORD)
            .await?;
        let token = self.accounts.login(&email, TEST_PASSWORD).await?;
        Ok((user, token.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figura_core::types::NewGenerationRecord;
    use figura_core::AuthAdapter;
    use figura_core::types::AuthToken;
    use figura_meshgen::{NoopReconciler, PollState};
    use tokio::sync::watch;
    use tokio_util::sync::CancellationToken;

    use crate::mock_generators::StatusStep;

    #[tokio::test]
    async fn sign_up_yields_a_working_token() {
        let harness = TestHarness::builder().build().await.unwrap();
        let (user, token) = harness.sign_up("alice").await.unwrap();

        let identity = harness
            .accounts
            .authenticate(AuthToken { token })
            .await
            .unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn registry_is_usable() {
        let harness = TestHarness::builder().build().await.unwrap();
        let (user, _) = harness.sign_up("bob").await.unwrap();
        let record = harness
            .storage
            .create_record(user.id, &NewGenerationRecord::default())
            .await
            .unwrap();
        assert_eq!(record.owner, user.id);
    }

    #[tokio::test]
    async fn poller_runs_against_doubles() {
        let harness = TestHarness::builder()
            .with_poll_policy(3, Duration::from_secs(5))
            .build()
            .await
            .unwrap();
        harness
            .mesh
            .script("job", [StatusStep::processing(), StatusStep::completed("/files/job.glb")]);

        let (tx, rx) = watch::channel(PollState::Submitted);
        let outcome = harness
            .poller()
            .run("job", &NoopReconciler, &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 2);
        assert_eq!(harness.sleeper.total(), Duration::from_secs(10));
        assert!(rx.borrow().is_terminal());
    }
}
