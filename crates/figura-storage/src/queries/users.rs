// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User account operations.

use figura_core::types::{User, UserCredentials, UserId};
use figura_core::FiguraError;
use rusqlite::{params, OptionalExtension};

use crate::database::{now_timestamp, Database};

enum CreateOutcome {
    Created(User),
    UsernameTaken,
    EmailTaken,
}

/// Create a new user. Username and email must both be unused.
pub async fn create_user(
    db: &Database,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, FiguraError> {
    let username = username.to_string();
    let email = email.to_string();
    let password_hash = password_hash.to_string();
    let created_at = now_timestamp();

    let outcome = db
        .connection()
        .call(move |conn| -> Result<CreateOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;
            let username_taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                params![username],
                |row| row.get(0),
            )?;
            if username_taken {
                return Ok(CreateOutcome::UsernameTaken);
            }
            let email_taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                params![email],
                |row| row.get(0),
            )?;
            if email_taken {
                return Ok(CreateOutcome::EmailTaken);
            }

            tx.execute(
                "INSERT INTO users (username, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![username, email, password_hash, created_at],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(CreateOutcome::Created(User {
                id: UserId(id),
                username,
                email,
                created_at,
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match outcome {
        CreateOutcome::Created(user) => Ok(user),
        CreateOutcome::UsernameTaken => {
            Err(FiguraError::Conflict("username already registered".to_string()))
        }
        CreateOutcome::EmailTaken => {
            Err(FiguraError::Conflict("email already registered".to_string()))
        }
    }
}

/// Get a user by ID.
pub async fn get_user(db: &Database, id: UserId) -> Result<Option<User>, FiguraError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, username, email, created_at FROM users WHERE id = ?1",
                params![id.0],
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

/// Look up a user and their password hash by email, for login.
pub async fn get_user_credentials_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<UserCredentials>, FiguraError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, username, email, created_at, password_hash
                 FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserCredentials {
                        user: User {
                            id: UserId(row.get(0)?),
                            username: row.get(1)?,
                            email: row.get(2)?,
                            created_at: row.get(3)?,
                        },
                        password_hash: row.get(4)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
