// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use figura_config::model::StorageConfig;
use figura_core::types::{
    ArtifactRef, GenerationRecord, NewGenerationRecord, Page, PublicRecord, RecordId,
    RecordUpdate, User, UserCredentials, UserId,
};
use figura_core::{AdapterType, FiguraError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed registry.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, FiguraError> {
        self.db.get().ok_or_else(|| FiguraError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), FiguraError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FiguraError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FiguraError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), FiguraError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| FiguraError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), FiguraError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Users ---

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, FiguraError> {
        queries::users::create_user(self.db()?, username, email, password_hash).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, FiguraError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn get_user_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, FiguraError> {
        queries::users::get_user_credentials_by_email(self.db()?, email).await
    }

    // --- Tokens ---

    async fn insert_token(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: &str,
    ) -> Result<(), FiguraError> {
        queries::tokens::insert_token(self.db()?, token_hash, user_id, expires_at).await
    }

    async fn resolve_token(&self, token_hash: &str, now: &str) -> Result<Option<User>, FiguraError> {
        queries::tokens::resolve_token(self.db()?, token_hash, now).await
    }

    async fn delete_token(&self, token_hash: &str) -> Result<(), FiguraError> {
        queries::tokens::delete_token(self.db()?, token_hash).await
    }

    async fn purge_expired_tokens(&self, now: &str) -> Result<usize, FiguraError> {
        queries::tokens::purge_expired_tokens(self.db()?, now).await
    }

    // --- Generation records ---

    async fn create_record(
        &self,
        owner: UserId,
        record: &NewGenerationRecord,
    ) -> Result<GenerationRecord, FiguraError> {
        queries::records::create_record(self.db()?, owner, record).await
    }

    async fn get_record(&self, owner: UserId, id: RecordId) -> Result<GenerationRecord, FiguraError> {
        queries::records::get_record(self.db()?, owner, id).await
    }

    async fn list_records(
        &self,
        owner: UserId,
        page: Page,
    ) -> Result<Vec<GenerationRecord>, FiguraError> {
        queries::records::list_records(self.db()?, owner, page).await
    }

    async fn update_record(
        &self,
        owner: UserId,
        id: RecordId,
        update: &RecordUpdate,
    ) -> Result<GenerationRecord, FiguraError> {
        queries::records::update_record(self.db()?, owner, id, update).await
    }

    async fn set_visibility(
        &self,
        owner: UserId,
        id: RecordId,
        is_public: bool,
    ) -> Result<GenerationRecord, FiguraError> {
        queries::records::set_visibility(self.db()?, owner, id, is_public).await
    }

    async fn delete_record(&self, owner: UserId, id: RecordId) -> Result<(), FiguraError> {
        queries::records::delete_record(self.db()?, owner, id).await
    }

    async fn list_public_records(
        &self,
        search: Option<&str>,
        page: Page,
    ) -> Result<Vec<PublicRecord>, FiguraError> {
        queries::records::list_public_records(self.db()?, search, page).await
    }

    async fn attach_generated_3d(
        &self,
        id: RecordId,
        artifact: &ArtifactRef,
    ) -> Result<bool, FiguraError> {
        queries::records::attach_generated_3d(self.db()?, id, artifact).await
    }
}
