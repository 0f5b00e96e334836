//! Long-running pipeline loop shared by every indexer task.

use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound of the failure backoff.
pub const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Smallest failure delay, used when a pipeline runs back to back.
const MIN_BACKOFF: Duration = Duration::from_secs(1);

/// A unit of periodic work.
///
/// [`Pipeline::spawn`] drives `run_once` in a loop: after a success the loop sleeps for
/// [`Pipeline::interval`]; after consecutive failures it sleeps for an exponentially growing
/// delay capped at [`MAX_BACKOFF`]. Cancellation is observed while running and while sleeping.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> String;

    /// Delay between two successful runs.
    fn interval(&self) -> Duration;

    /// Delay before the first run.
    fn initial_delay(&self) -> Duration {
        Duration::ZERO
    }

    /// Perform one cycle of work.
    async fn run_once(&mut self) -> Result<()>;

    /// Spawn the loop on the Tokio runtime.
    fn spawn(mut self, cancel: CancellationToken) -> JoinHandle<()>
    where
        Self: Sized + 'static,
    {
        tokio::spawn(async move {
            let name = self.name();
            info!(pipeline = %name, "Starting pipeline");

            if !sleep_or_cancel(self.initial_delay(), &cancel).await {
                info!(pipeline = %name, "Pipeline cancelled");
                return;
            }

            let mut backoff = Backoff::new(self.interval());
            loop {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => break,
                    outcome = self.run_once() => outcome,
                };

                let delay = match outcome {
                    Ok(()) => {
                        backoff.reset();
                        self.interval()
                    }
                    Err(e) => {
                        let delay = backoff.next_delay();
                        warn!(pipeline = %name, err = %e, retry_in = ?delay, "Pipeline run failed");
                        delay
                    }
                };
                debug!(pipeline = %name, sleep = ?delay, "Pipeline cycle finished");

                if !sleep_or_cancel(delay, &cancel).await {
                    break;
                }
            }
            info!(pipeline = %name, "Pipeline cancelled");
        })
    }
}

/// Sleep for `delay`. Returns `false` if `cancel` fired first.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Exponential delay after consecutive failures.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    failures: u32,
}

impl Backoff {
    /// Backoff starting at `base`, floored at one second.
    pub fn new(base: Duration) -> Self {
        Self { base: base.max(MIN_BACKOFF), failures: 0 }
    }

    /// Record a failure and return the delay before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 1u32.checked_shl(self.failures).unwrap_or(u32::MAX);
        self.failures = self.failures.saturating_add(1);
        self.base.saturating_mul(factor).min(MAX_BACKOFF)
    }

    /// Forget previous failures.
    pub const fn reset(&mut self) {
        self.failures = 0;
    }
}
