//! Fixed-interval scheduling of sync cycles

use crate::engine::SyncEngine;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use treesync_types::{CycleReport, Error, FileSystem, Result};

/// Time to sleep after a cycle that took `elapsed`, so cycles start `interval` apart
///
/// A cycle that overran the interval is followed immediately by the next one.
pub fn next_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Runs an engine's cycles one after another on a fixed interval
///
/// Cycles run on tokio's blocking pool and never overlap.
#[derive(Debug)]
pub struct Scheduler<F> {
    engine: Arc<SyncEngine<F>>,
}

impl<F> Scheduler<F>
where
    F: FileSystem + Send + Sync + 'static,
{
    /// Create a scheduler driving `engine`
    pub fn new(engine: SyncEngine<F>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// The engine this scheduler drives
    pub fn engine(&self) -> &SyncEngine<F> {
        &self.engine
    }

    /// Run a single cycle to completion
    pub async fn run_once(&self) -> Result<CycleReport> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.run_cycle())
            .await
            .map_err(|e| Error::sync(format!("cycle task failed: {e}")))?
    }

    /// Run cycles forever
    ///
    /// Aborted cycles are logged and retried after the usual delay. Only a
    /// fatal error stops the loop; it is returned to the caller.
    pub async fn run_forever(&self) -> Error {
        let interval = self.engine.config().interval().as_duration();
        info!(
            "Synchronizing '{}' -> '{}' every {}",
            self.engine.config().source().display(),
            self.engine.config().destination().display(),
            self.engine.config().interval()
        );

        loop {
            let started = Instant::now();
            match self.run_once().await {
                Ok(report) => info!(
                    "Cycle {} complete ({:?}, {} mutations)",
                    report.cycle_id,
                    report.outcome,
                    report.stats.mutations()
                ),
                Err(e) if e.is_fatal() => {
                    error!("Stopping after fatal error: {}", e);
                    return e;
                }
                Err(e) => warn!("Cycle aborted: {}", e),
            }

            let delay = next_delay(interval, started.elapsed());
            info!("Next cycle in {:.1} seconds", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }
}
