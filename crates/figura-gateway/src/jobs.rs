// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process registry of running pollers.
//!
//! Every submitted 3D job gets one background poller. The tracker keeps its
//! state receiver and cancellation token keyed by request id so the API can
//! report progress, stop polling for a single job, or tear down the jobs a
//! session started when that session logs out. Finished entries keep
//! answering status reads for the retention period, then are swept.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use figura_core::types::{RecordId, UserId};
use figura_core::FiguraError;
use figura_meshgen::{GenerationPoller, PollOutcome, PollState, Reconciler};

/// A poller registered with the tracker.
#[derive(Clone)]
pub struct TrackedJob {
    pub request_id: String,
    pub owner: UserId,
    pub record_id: Option<RecordId>,
    /// Hash of the bearer token that started the job.
    session: String,
    state: watch::Receiver<PollState>,
    cancel: CancellationToken,
    finished_at: Arc<OnceLock<Instant>>,
}

impl TrackedJob {
    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> JobView {
        JobView {
            request_id: self.request_id.clone(),
            record_id: self.record_id,
            state: self.state(),
        }
    }

    /// Stops local polling. The job keeps running on the service.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn expired(&self, now: Instant, retention: Duration) -> bool {
        self.finished_at
            .get()
            .is_some_and(|finished| now.saturating_duration_since(*finished) >= retention)
    }
}

/// Serialized job progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobView {
    pub request_id: String,
    pub record_id: Option<RecordId>,
    #[serde(flatten)]
    pub state: PollState,
}

/// Retention used by [`JobTracker::new`].
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<DashMap<String, TrackedJob>>,
    retention: Duration,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker that forgets finished jobs `retention` after they settle.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            retention,
        }
    }

    /// Spawns a poller for `request_id` and registers it.
    ///
    /// The poller stops when `parent` is cancelled. Starting a job under an
    /// id that is still being polled cancels the older poller first.
    /// Expired entries are swept on every start.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &self,
        poller: &GenerationPoller,
        request_id: String,
        owner: UserId,
        session: &str,
        record_id: Option<RecordId>,
        reconciler: Box<dyn Reconciler>,
        parent: &CancellationToken,
    ) -> (JobView, JoinHandle<Result<PollOutcome, FiguraError>>) {
        self.sweep();

        let (tx, rx) = watch::channel(PollState::Submitted);
        let cancel = parent.child_token();
        let finished_at = Arc::new(OnceLock::new());
        let job = TrackedJob {
            request_id: request_id.clone(),
            owner,
            record_id,
            session: session.to_string(),
            state: rx,
            cancel: cancel.clone(),
            finished_at: finished_at.clone(),
        };
        let view = job.view();

        if let Some(previous) = self.jobs.insert(request_id.clone(), job) {
            if !previous.state().is_terminal() {
                tracing::warn!(request_id = %request_id, "replacing active poller");
                previous.cancel();
            }
        }

        let poller = poller.clone();
        let handle = tokio::spawn(async move {
            let result = poller
                .run(&request_id, reconciler.as_ref(), &tx, &cancel)
                .await;
            let _ = finished_at.set(Instant::now());
            if let Err(e) = &result {
                tracing::info!(request_id = %request_id, kind = e.kind(), "poller finished without result");
            }
            result
        });
        (view, handle)
    }

    pub fn get(&self, request_id: &str) -> Option<TrackedJob> {
        self.jobs.get(request_id).map(|entry| entry.value().clone())
    }

    /// Cancels every active poller started with the session token hashing
    /// to `session`. Returns how many were still running.
    pub fn cancel_session(&self, session: &str) -> usize {
        let mut cancelled = 0;
        for entry in self.jobs.iter() {
            let job = entry.value();
            if job.session == session && !job.state().is_terminal() {
                job.cancel();
                cancelled += 1;
            }
        }
        cancelled
    }

    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for entry in self.jobs.iter() {
            if !entry.value().state().is_terminal() {
                entry.value().cancel();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Drops jobs that finished at least the retention period ago. Returns
    /// how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.jobs.retain(|_, job| {
            let expired = job.expired(now, self.retention);
            removed += usize::from(expired);
            !expired
        });
        if removed > 0 {
            tracing::debug!(removed, "swept finished jobs");
        }
        removed
    }

    /// Number of tracked jobs, finished or not.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of pollers not yet in a terminal state.
    pub fn active(&self) -> usize {
        self.jobs
            .iter()
            .filter(|entry| !entry.value().state().is_terminal())
            .count()
    }
}
