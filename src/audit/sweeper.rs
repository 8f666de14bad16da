//! Periodic retention sweeps.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::logger::AuditLog;

/// Background task that purges expired events on a fixed interval.
///
/// The first sweep runs one interval after start. Call [`stop`](Self::stop)
/// at shutdown to end the task.
pub struct RetentionSweeper {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl RetentionSweeper {
    /// Spawn the sweep task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn start(log: Arc<AuditLog>, retention_days: u32, interval: Duration) -> Self {
        let shutdown = Arc::new(Notify::new());
        let stop_signal = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let report = log.purge_older_than(retention_days);
                        debug!(
                            removed = report.removed_count,
                            size = report.size_after,
                            "Retention sweep complete"
                        );
                    }
                    _ = stop_signal.notified() => {
                        debug!("Retention sweeper stopping");
                        break;
                    }
                }
            }
        });

        info!(
            retention_days,
            interval_secs = interval.as_secs(),
            "Retention sweeper started"
        );

        Self { shutdown, handle }
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(self) {
        // notify_one stores a permit, so the signal is not lost if the task
        // is mid-sweep rather than waiting.
        self.shutdown.notify_one();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Retention sweeper task failed");
        }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
