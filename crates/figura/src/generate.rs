// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `figura generate` and `figura status` command implementations.
//!
//! Both talk to the 3D service directly, bypassing the registry. `generate`
//! submits one image and polls it to a terminal state with the same poller
//! the HTTP API uses; Ctrl+C stops polling without touching the remote job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use figura_config::model::FiguraConfig;
use figura_core::media::sniff_image;
use figura_core::{FiguraError, MeshGenerator, Sleeper};
use figura_meshgen::{
    GenerationPoller, MeshProvider, NoopReconciler, PollOutcome, PollPolicy, PollState,
    TokioSleeper,
};

/// Arguments of `figura generate`.
#[derive(Debug)]
pub struct GenerateArgs {
    pub image: PathBuf,
    pub max_attempts: Option<u32>,
    pub interval: Option<u64>,
    pub output: Option<PathBuf>,
}

impl GenerateArgs {
    fn policy(&self, config: &FiguraConfig) -> PollPolicy {
        let base = PollPolicy::from_config(&config.mesh);
        PollPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            interval: self.interval.map(Duration::from_secs).unwrap_or(base.interval),
        }
    }
}

/// Run the `figura generate` command.
pub async fn run_generate(config: &FiguraConfig, args: GenerateArgs) -> Result<(), FiguraError> {
    let policy = args.policy(config);
    if policy.max_attempts == 0 || policy.interval.is_zero() {
        return Err(FiguraError::InvalidInput(
            "--max-attempts and --interval must be at least 1".into(),
        ));
    }

    let image = tokio::fs::read(&args.image).await.map_err(|e| {
        FiguraError::InvalidInput(format!("cannot read {}: {e}", args.image.display()))
    })?;

    let generator: Arc<dyn MeshGenerator> = Arc::new(MeshProvider::new(&config.mesh)?);
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let outcome = submit_and_wait(
        generator.clone(),
        Arc::new(TokioSleeper),
        policy,
        &image,
        &cancel,
    )
    .await?;
    println!("{}", outcome.model_url);

    if let Some(output) = &args.output {
        download(generator.as_ref(), &outcome.model_url, output).await?;
        println!("saved {}", output.display());
    }
    Ok(())
}

/// Submits `image` and polls the job until it settles.
///
/// Progress goes to stderr; the outcome carries the service's model URL.
pub async fn submit_and_wait(
    generator: Arc<dyn MeshGenerator>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
    image: &[u8],
    cancel: &CancellationToken,
) -> Result<PollOutcome, FiguraError> {
    sniff_image(image)?;
    let receipt = generator.submit(image).await?;
    info!(request_id = %receipt.request_id, status = %receipt.status, "job submitted");
    eprintln!(
        "submitted {} (up to {} checks every {}s)",
        receipt.request_id,
        policy.max_attempts,
        policy.interval.as_secs()
    );

    let (state, mut progress) = watch::channel(PollState::Submitted);
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let current = progress.borrow_and_update().clone();
            if let PollState::Polling { attempts } = current {
                if attempts > 0 {
                    eprintln!("  check {attempts}: still running");
                }
            }
        }
    });

    let poller = GenerationPoller::new(generator, sleeper, policy);
    let result = poller
        .run(&receipt.request_id, &NoopReconciler, &state, cancel)
        .await;
    drop(state);
    let _ = reporter.await;
    result
}

async fn download(
    generator: &dyn MeshGenerator,
    model_url: &str,
    output: &Path,
) -> Result<(), FiguraError> {
    let bytes = generator.fetch_artifact(model_url).await?;
    tokio::fs::write(output, &bytes)
        .await
        .map_err(|e| FiguraError::Internal(format!("cannot write {}: {e}", output.display())))?;
    info!(path = %output.display(), bytes = bytes.len(), "mesh downloaded");
    Ok(())
}

/// Run the `figura status` command.
pub async fn run_status(
    config: &FiguraConfig,
    request_id: &str,
    json: bool,
) -> Result<(), FiguraError> {
    let generator = MeshProvider::new(&config.mesh)?;
    let report = generator.get_status(request_id).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| FiguraError::Internal(format!("failed to render report: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    match (&report.model_url, &report.message) {
        (Some(url), _) => println!("{request_id}: {} {url}", report.status),
        (None, Some(message)) => println!("{request_id}: {} ({message})", report.status),
        (None, None) => println!("{request_id}: {}", report.status),
    }
    Ok(())
}
