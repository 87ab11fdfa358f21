// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use figura_auth::Accounts;
use figura_config::model::{ArtifactsConfig, ImageConfig, ServerConfig};
use figura_core::{ArtifactStore, FiguraError, ImageGenerator, MeshGenerator, StorageAdapter};
use figura_meshgen::GenerationPoller;

use crate::auth::require_bearer;
use crate::generation;
use crate::handlers;
use crate::jobs::JobTracker;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Model registry.
    pub storage: Arc<dyn StorageAdapter>,
    /// Uploaded and generated files.
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Registration, login and token resolution.
    pub accounts: Arc<Accounts>,
    /// 2D image model.
    pub images: Arc<dyn ImageGenerator>,
    /// 3D generation service.
    pub meshes: Arc<dyn MeshGenerator>,
    /// Poller template cloned for every submitted job.
    pub poller: GenerationPoller,
    pub jobs: JobTracker,
    pub image_config: Arc<ImageConfig>,
    /// Copy completed meshes into the artifact store before reconciling.
    pub mirror_artifacts: bool,
    /// Parent token of every poller; cancelled on shutdown.
    pub shutdown: CancellationToken,
    pub started_at: Instant,
}

/// Assembles the full route table.
///
/// Public: `/health`, registration, login, the public gallery and the
/// static artifact tree. Everything else sits behind [`require_bearer`].
pub fn build_router(
    state: GatewayState,
    server: &ServerConfig,
    artifacts: &ArtifactsConfig,
) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/public/models", get(handlers::list_public_models));

    let api_routes = Router::new()
        .route("/api/auth/me", get(handlers::me))
        .route("/api/auth/logout", post(handlers::logout))
        .route(
            "/api/models",
            post(handlers::create_model).get(handlers::list_models),
        )
        .route(
            "/api/models/{id}",
            get(handlers::get_model)
                .put(handlers::update_model)
                .delete(handlers::delete_model),
        )
        .route("/api/models/{id}/visibility", put(handlers::set_visibility))
        .route("/api/models/{id}/generate-3d", post(generation::generate_3d_from_record))
        .route("/api/generate-2d", post(generation::generate_2d))
        .route("/api/generate", post(generation::generate))
        .route(
            "/api/jobs/{request_id}",
            get(generation::get_job).delete(generation::cancel_job),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    let mut app = Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .with_state(state)
        .nest_service(&artifacts.public_prefix, ServeDir::new(&artifacts.root))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    if server.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Serves the API until `shutdown` is cancelled.
pub async fn start_server(
    server: &ServerConfig,
    artifacts: &ArtifactsConfig,
    state: GatewayState,
) -> Result<(), FiguraError> {
    let shutdown = state.shutdown.clone();
    let app = build_router(state, server, artifacts);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FiguraError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| FiguraError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
