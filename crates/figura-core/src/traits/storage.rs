// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the user and generation-record registry.

use async_trait::async_trait;

use crate::error::FiguraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ArtifactRef, GenerationRecord, NewGenerationRecord, Page, PublicRecord, RecordId,
    RecordUpdate, User, UserCredentials, UserId,
};

/// Adapter for the persistent registry.
///
/// Record operations that take an `owner` are scoped to that user: a record
/// that exists but belongs to someone else yields [`FiguraError::Forbidden`]
/// and is never modified.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), FiguraError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), FiguraError>;

    // --- Users ---

    /// Creates a user. Duplicate username or email fails with `Conflict`.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, FiguraError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, FiguraError>;

    async fn get_user_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, FiguraError>;

    // --- Bearer tokens (stored hashed) ---

    async fn insert_token(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: &str,
    ) -> Result<(), FiguraError>;

    /// Resolves a token hash to its user, ignoring tokens expired at `now`.
    async fn resolve_token(&self, token_hash: &str, now: &str) -> Result<Option<User>, FiguraError>;

    async fn delete_token(&self, token_hash: &str) -> Result<(), FiguraError>;

    /// Removes every token expired at `now`, returning how many were removed.
    async fn purge_expired_tokens(&self, now: &str) -> Result<usize, FiguraError>;

    // --- Generation records ---

    async fn create_record(
        &self,
        owner: UserId,
        record: &NewGenerationRecord,
    ) -> Result<GenerationRecord, FiguraError>;

    async fn get_record(&self, owner: UserId, id: RecordId) -> Result<GenerationRecord, FiguraError>;

    async fn list_records(&self, owner: UserId, page: Page)
    -> Result<Vec<GenerationRecord>, FiguraError>;

    async fn update_record(
        &self,
        owner: UserId,
        id: RecordId,
        update: &RecordUpdate,
    ) -> Result<GenerationRecord, FiguraError>;

    async fn set_visibility(
        &self,
        owner: UserId,
        id: RecordId,
        is_public: bool,
    ) -> Result<GenerationRecord, FiguraError>;

    async fn delete_record(&self, owner: UserId, id: RecordId) -> Result<(), FiguraError>;

    /// Stores the result of a 2D generation on a record owned by `owner`.
    async fn attach_generated_2d(
        &self,
        owner: UserId,
        id: RecordId,
        artifact: &ArtifactRef,
    ) -> Result<GenerationRecord, FiguraError> {
        let update = RecordUpdate {
            generated_2d_ref: Some(artifact.clone()),
            ..RecordUpdate::default()
        };
        self.update_record(owner, id, &update).await
    }

    /// Public gallery listing with optional case-insensitive substring search.
    async fn list_public_records(
        &self,
        search: Option<&str>,
        page: Page,
    ) -> Result<Vec<PublicRecord>, FiguraError>;

    /// Reconciliation write for a completed 3D job.
    ///
    /// Returns `true` if the stored reference changed, `false` if it already
    /// held `artifact`.
    async fn attach_generated_3d(
        &self,
        id: RecordId,
        artifact: &ArtifactRef,
    ) -> Result<bool, FiguraError>;
}
