// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer token persistence. Only SHA-256 hashes of tokens are stored.

use figura_core::types::{User, UserId};
use figura_core::FiguraError;
use rusqlite::{params, OptionalExtension};

use crate::database::{now_timestamp, Database};

/// Store a token hash for `user_id`, valid until `expires_at`.
pub async fn insert_token(
    db: &Database,
    token_hash: &str,
    user_id: UserId,
    expires_at: &str,
) -> Result<(), FiguraError> {
    let token_hash = token_hash.to_string();
    let expires_at = expires_at.to_string();
    let created_at = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO auth_tokens (token_hash, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![token_hash, user_id.0, created_at, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Resolve a token hash to its owner, ignoring tokens that expired at or before `now`.
pub async fn resolve_token(
    db: &Database,
    token_hash: &str,
    now: &str,
) -> Result<Option<User>, FiguraError> {
    let token_hash = token_hash.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT u.id, u.username, u.email, u.created_at
                 FROM auth_tokens t JOIN users u ON u.id = t.user_id
                 WHERE t.token_hash = ?1 AND t.expires_at > ?2",
                params![token_hash, now],
                |row| {
                    Ok(User {
                        id: UserId(row.get(0)?),
                        username: row.get(1)?,
                        email: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Revoke a token.
pub async fn delete_token(db: &Database, token_hash: &str) -> Result<(), FiguraError> {
    let token_hash = token_hash.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "DELETE FROM auth_tokens WHERE token_hash = ?1",
                params![token_hash],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete every token expired at `now`. Returns the number removed.
pub async fn purge_expired_tokens(db: &Database, now: &str) -> Result<usize, FiguraError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM auth_tokens WHERE expires_at <= ?1",
                params![now],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
