// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account registration, login, and bearer token authentication.
//!
//! [`Accounts`] owns the whole token lifecycle: it issues opaque tokens at
//! login, stores only their hashes in the registry, and resolves them back
//! to identities through [`AuthAdapter`].

pub mod crypto;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use figura_config::model::AuthConfig;
use figura_core::traits::adapter::PluginAdapter;
use figura_core::traits::auth::AuthAdapter;
use figura_core::traits::storage::StorageAdapter;
use figura_core::types::{AdapterType, AuthIdentity, AuthToken, HealthStatus, IssuedToken, User};
use figura_core::FiguraError;
use figura_storage::format_timestamp;

use crate::crypto::{generate_token, hash_password, hash_token, verify_password, PasswordParams};

const LOGIN_FAILED: &str = "incorrect email or password";

/// Registry-backed account service.
pub struct Accounts {
    storage: Arc<dyn StorageAdapter>,
    config: AuthConfig,
}

impl Accounts {
    pub fn new(storage: Arc<dyn StorageAdapter>, config: AuthConfig) -> Self {
        Self { storage, config }
    }

    /// Register a new account.
    ///
    /// Username and email are trimmed; the email must contain `@` and the
    /// password must meet the configured minimum length. A taken username
    /// or email fails with [`FiguraError::Conflict`].
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, FiguraError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() {
            return Err(FiguraError::InvalidInput("username must not be empty".into()));
        }
        if !email.contains('@') {
            return Err(FiguraError::InvalidInput(format!(
                "`{email}` is not a valid email address"
            )));
        }
        if password.chars().count() < self.config.min_password_length {
            return Err(FiguraError::InvalidInput(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        let params = PasswordParams::from_config(&self.config);
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, params))
            .await
            .map_err(|e| FiguraError::Internal(format!("password hashing task failed: {e}")))??;

        let user = self
            .storage
            .create_user(username, email, &password_hash)
            .await?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Exchange credentials for a bearer token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, FiguraError> {
        let Some(credentials) = self
            .storage
            .get_user_credentials_by_email(email.trim())
            .await?
        else {
            return Err(FiguraError::Unauthorized(LOGIN_FAILED.into()));
        };

        let password = password.to_string();
        let stored = credentials.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| FiguraError::Internal(format!("password check task failed: {e}")))?;
        if !verified {
            return Err(FiguraError::Unauthorized(LOGIN_FAILED.into()));
        }

        let token = generate_token();
        let expires_at = format_timestamp(self.token_expiry());
        self.storage
            .insert_token(&hash_token(&token), credentials.user.id, &expires_at)
            .await?;

        info!(user_id = %credentials.user.id, "login succeeded");
        Ok(IssuedToken {
            access_token: token,
            token_type: "bearer".to_string(),
            expires_at,
        })
    }

    /// Revoke a token. Revoking an unknown token is not an error.
    pub async fn logout(&self, token: &str) -> Result<(), FiguraError> {
        self.storage.delete_token(&hash_token(token)).await
    }

    /// Drop every expired token from the registry.
    pub async fn purge_expired_tokens(&self) -> Result<usize, FiguraError> {
        let removed = self
            .storage
            .purge_expired_tokens(&format_timestamp(chrono::Utc::now()))
            .await?;
        if removed > 0 {
            debug!(removed, "purged expired tokens");
        }
        Ok(removed)
    }

    fn token_expiry(&self) -> chrono::DateTime<chrono::Utc> {
        let now = chrono::Utc::now();
        i64::try_from(self.config.token_ttl_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
    }
}

#[async_trait]
impl PluginAdapter for Accounts {
    fn name(&self) -> &str {
        "accounts"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, FiguraError> {
        self.storage.health_check().await
    }

    async fn shutdown(&self) -> Result<(), FiguraError> {
        Ok(())
    }
}

#[async_trait]
impl AuthAdapter for Accounts {
    async fn authenticate(&self, token: AuthToken) -> Result<AuthIdentity, FiguraError> {
        if token.token.is_empty() {
            return Err(FiguraError::Unauthorized("missing bearer token".into()));
        }
        let now = format_timestamp(chrono::Utc::now());
        let user = self
            .storage
            .resolve_token(&hash_token(&token.token), &now)
            .await?
            .ok_or_else(|| FiguraError::Unauthorized("invalid or expired token".into()))?;
        Ok(AuthIdentity {
            user_id: user.id,
            username: user.username,
        })
    }
}
