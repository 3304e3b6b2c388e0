//! Background watchdog for dispatched tasks that never report back.

use std::sync::Arc;
use std::time::Duration;

use calc_compute::Orchestrator;
use calc_core::config::WatchdogConfig;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Spawn the stale-task watchdog.
///
/// Every `interval_secs` it asks the orchestrator for tasks dispatched longer
/// than `stale_task_secs` ago; the orchestrator logs each one. Nothing is
/// requeued.
pub fn spawn_watchdog(orchestrator: Arc<Orchestrator>, config: &WatchdogConfig) -> JoinHandle<()> {
    let period = Duration::from_secs(config.interval_secs.max(1));
    let threshold = Duration::from_secs(config.stale_task_secs);
    info!(
        every_secs = period.as_secs(),
        stale_after_secs = threshold.as_secs(),
        "stale task watchdog started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match orchestrator.stale_tasks(threshold) {
                Ok(stale) if stale.is_empty() => debug!("no stale tasks"),
                Ok(stale) => debug!(count = stale.len(), "stale tasks reported"),
                Err(e) => error!(error = %e, "watchdog scan failed"),
            }
        }
    })
}
