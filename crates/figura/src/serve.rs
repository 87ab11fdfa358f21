// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `figura serve` command implementation.
//!
//! Opens the registry and artifact store, builds the 2D and 3D providers,
//! and runs the HTTP API until SIGINT or SIGTERM. An hourly housekeeping
//! task purges expired tokens, forgets finished jobs and logs heap usage.
//! On shutdown every in-flight poller is cancelled before the database is
//! closed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use figura_auth::Accounts;
use figura_config::model::FiguraConfig;
use figura_core::{FiguraError, ImageGenerator, MeshGenerator, PluginAdapter, StorageAdapter};
use figura_gateway::{GatewayState, JobTracker};
use figura_imagegen::GeminiImageClient;
use figura_meshgen::{GenerationPoller, MeshProvider, PollPolicy, TokioSleeper};
use figura_storage::{FsArtifactStore, SqliteStorage};

const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Runs the `figura serve` command.
pub async fn run_serve(config: FiguraConfig) -> Result<(), FiguraError> {
    info!("starting figura serve");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

    let artifacts = Arc::new(FsArtifactStore::from_config(&config.artifacts));
    match artifacts.health_check().await? {
        figura_core::types::HealthStatus::Healthy => {}
        other => warn!(status = ?other, root = %config.artifacts.root, "artifact store not ready"),
    }

    let images: Arc<dyn ImageGenerator> = Arc::new(GeminiImageClient::new(&config.image).map_err(|e| {
        error!(error = %e, "failed to initialize image generator");
        eprintln!(
            "error: a Gemini API key is required. Set image.api_key, FIGURA_IMAGE_API_KEY or GEMINI_API_KEY"
        );
        e
    })?);
    let meshes: Arc<dyn MeshGenerator> = Arc::new(MeshProvider::new(&config.mesh)?);
    let policy = PollPolicy::from_config(&config.mesh);
    info!(
        max_attempts = policy.max_attempts,
        interval_secs = policy.interval.as_secs(),
        "generation poller configured"
    );
    let poller = GenerationPoller::new(meshes.clone(), Arc::new(TokioSleeper), policy);

    let accounts = Arc::new(Accounts::new(storage.clone(), config.auth.clone()));
    let cancel = install_signal_handler();
    let jobs = JobTracker::with_retention(Duration::from_secs(config.server.job_retention_secs));
    let _housekeeping = spawn_housekeeping(accounts.clone(), jobs.clone(), cancel.clone());

    let state = GatewayState {
        storage: storage.clone(),
        artifacts,
        accounts,
        images,
        meshes,
        poller,
        jobs: jobs.clone(),
        image_config: Arc::new(config.image.clone()),
        mirror_artifacts: config.mesh.mirror_artifacts,
        shutdown: cancel.clone(),
        started_at: Instant::now(),
    };

    let served = figura_gateway::start_server(&config.server, &config.artifacts, state).await;
    // A bind failure returns before any signal; stop the background tasks too.
    cancel.cancel();

    let stopped = jobs.cancel_all();
    if stopped > 0 {
        info!(stopped, "cancelled in-flight pollers");
    }
    if let Err(e) = storage.close().await {
        warn!(error = %e, "failed to close storage cleanly");
    }

    served?;
    info!("figura serve shutdown complete");
    Ok(())
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a token that is cancelled when either signal arrives.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Runs [`housekeep`] every [`HOUSEKEEPING_INTERVAL`] until `cancel` fires.
/// The first pass runs immediately.
fn spawn_housekeeping(
    accounts: Arc<Accounts>,
    jobs: JobTracker,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HOUSEKEEPING_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => housekeep(&accounts, &jobs).await,
                _ = cancel.cancelled() => {
                    debug!("housekeeping task shutting down");
                    break;
                }
            }
        }
    })
}

async fn housekeep(accounts: &Accounts, jobs: &JobTracker) {
    if let Err(e) = accounts.purge_expired_tokens().await {
        warn!(error = %e, "token purge failed (non-fatal)");
    }
    let swept = jobs.sweep();
    let (allocated, resident) = heap_stats();
    info!(
        tracked_jobs = jobs.len(),
        active_jobs = jobs.active(),
        swept_jobs = swept,
        allocated_mb = allocated / (1024 * 1024),
        resident_mb = resident / (1024 * 1024),
        "housekeeping"
    );
}

/// Allocated and resident heap bytes as reported by jemalloc.
#[cfg(not(target_env = "msvc"))]
fn heap_stats() -> (usize, usize) {
    // Stats are cached per epoch.
    let _ = tikv_jemalloc_ctl::epoch::advance();
    let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
    let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
    (allocated, resident)
}

#[cfg(target_env = "msvc")]
fn heap_stats() -> (usize, usize) {
    (0, 0)
}
