// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for health, accounts and the model registry.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use figura_core::types::{
    GenerationRecord, HealthStatus, IssuedToken, NewGenerationRecord, Page, PublicRecord,
    RecordId, RecordUpdate, User,
};
use figura_core::FiguraError;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::server::GatewayState;

/// Request body for POST /api/auth/register.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for POST /api/auth/login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response body for POST /api/auth/logout.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Pollers stopped along with the session.
    pub cancelled_jobs: usize,
}

/// Request body for PUT /api/models/{id}/visibility.
#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

/// Query of GET /api/public/models.
#[derive(Debug, Deserialize)]
pub struct PublicQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PublicQuery {
    fn page(&self) -> Page {
        let default = Page::default();
        Page::new(
            self.skip.unwrap_or(default.skip),
            self.limit.unwrap_or(default.limit),
        )
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every component is healthy, else `degraded`.
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub active_jobs: usize,
    pub storage: ComponentHealth,
    pub artifacts: ComponentHealth,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<HealthStatus> for ComponentHealth {
    fn from(health: HealthStatus) -> Self {
        match health {
            HealthStatus::Healthy => Self {
                status: "healthy",
                detail: None,
            },
            HealthStatus::Degraded(detail) => Self {
                status: "degraded",
                detail: Some(detail),
            },
            HealthStatus::Unhealthy(detail) => Self {
                status: "unhealthy",
                detail: Some(detail),
            },
        }
    }
}

/// GET /health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let storage = state
        .storage
        .health_check()
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
    let artifacts = state
        .artifacts
        .health_check()
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));

    let all_healthy = storage == HealthStatus::Healthy && artifacts == HealthStatus::Healthy;
    Json(HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        active_jobs: state.jobs.active(),
        storage: storage.into(),
        artifacts: artifacts.into(),
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<GatewayState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state
        .accounts
        .register(&body.username, &body.email, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<GatewayState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<IssuedToken>, ApiError> {
    Ok(Json(state.accounts.login(&body.email, &body.password).await?))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .storage
        .get_user(caller.user_id())
        .await?
        .ok_or_else(|| FiguraError::Unauthorized("user no longer exists".into()))?;
    Ok(Json(user))
}

/// POST /api/auth/logout
///
/// Revokes the presented token and stops the pollers started with it. Other
/// sessions of the same user keep theirs. Jobs already submitted keep
/// running on the 3D service.
pub async fn logout(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<LogoutResponse>, ApiError> {
    state.accounts.logout(&caller.token).await?;
    let cancelled_jobs = state.jobs.cancel_session(&caller.session());
    tracing::info!(user_id = %caller.user_id(), cancelled_jobs, "logged out");
    Ok(Json(LogoutResponse { cancelled_jobs }))
}

/// POST /api/models
pub async fn create_model(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<NewGenerationRecord>,
) -> Result<(StatusCode, Json<GenerationRecord>), ApiError> {
    let record = state.storage.create_record(caller.user_id(), &body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/models
pub async fn list_models(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<GenerationRecord>>, ApiError> {
    Ok(Json(
        state.storage.list_records(caller.user_id(), page).await?,
    ))
}

/// GET /api/models/{id}
pub async fn get_model(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<RecordId>,
) -> Result<Json<GenerationRecord>, ApiError> {
    Ok(Json(state.storage.get_record(caller.user_id(), id).await?))
}

/// PUT /api/models/{id}
pub async fn update_model(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<RecordId>,
    Json(update): Json<RecordUpdate>,
) -> Result<Json<GenerationRecord>, ApiError> {
    Ok(Json(
        state
            .storage
            .update_record(caller.user_id(), id, &update)
            .await?,
    ))
}

/// DELETE /api/models/{id}
pub async fn delete_model(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    state.storage.delete_record(caller.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/models/{id}/visibility
pub async fn set_visibility(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<RecordId>,
    Json(body): Json<VisibilityRequest>,
) -> Result<Json<GenerationRecord>, ApiError> {
    Ok(Json(
        state
            .storage
            .set_visibility(caller.user_id(), id, body.is_public)
            .await?,
    ))
}

/// GET /api/public/models
pub async fn list_public_models(
    State(state): State<GatewayState>,
    Query(query): Query<PublicQuery>,
) -> Result<Json<Vec<PublicRecord>>, ApiError> {
    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());
    Ok(Json(
        state.storage.list_public_records(search, query.page()).await?,
    ))
}
