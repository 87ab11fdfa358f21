// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer authentication middleware.
//!
//! Resolves `Authorization: Bearer <token>` through the account service and
//! stores the resulting [`Caller`] in the request extensions. Missing,
//! invalid and expired tokens all answer 401 with the same body shape.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use figura_core::types::{AuthIdentity, AuthToken, UserId};
use figura_core::AuthAdapter;

use crate::error::ApiError;
use crate::server::GatewayState;

/// The authenticated caller of a protected route.
#[derive(Clone)]
pub struct Caller {
    pub identity: AuthIdentity,
    /// The presented token, kept for logout.
    pub token: String,
}

impl Caller {
    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    /// Identifies this login session without exposing the token. Two logins
    /// of the same user have different sessions.
    pub fn session(&self) -> String {
        figura_auth::crypto::hash_token(&self.token)
    }
}

impl std::fmt::Debug for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caller")
            .field("identity", &self.identity)
            .field("token", &"[redacted]")
            .finish()
    }
}

/// Extracts the token from an `Authorization` header. The scheme is
/// matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

pub async fn require_bearer(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).unwrap_or_default().to_string();
    let identity = state
        .accounts
        .authenticate(AuthToken {
            token: token.clone(),
        })
        .await?;

    tracing::debug!(user_id = %identity.user_id, "caller authenticated");
    request.extensions_mut().insert(Caller { identity, token });
    Ok(next.run(request).await)
}
