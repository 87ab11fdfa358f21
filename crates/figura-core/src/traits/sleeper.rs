// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Injectable sleep abstraction for timer-driven loops.

use std::time::Duration;

use async_trait::async_trait;

/// Suspends the caller for a duration.
///
/// Production code sleeps on the tokio timer; tests substitute an
/// implementation that returns immediately.
#[async_trait]
pub trait Sleeper: Send + Sync + 'static {
    async fn sleep(&self, duration: Duration);
}
