//! Fixed-size pool of polling workers sharing one task source.

use std::sync::Arc;

use calc_core::config::AgentConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::source::TaskSource;
use crate::worker::{Worker, WorkerSettings};

pub struct WorkerPool {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<usize>>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one) on the current runtime.
    pub fn start(size: usize, source: Arc<dyn TaskSource>, config: &AgentConfig) -> Self {
        let size = size.max(1);
        let settings = WorkerSettings::from(config);
        let (shutdown, rx) = watch::channel(false);

        let handles = (0..size)
            .map(|id| {
                let worker = Worker::new(id, source.clone(), settings.clone(), rx.clone());
                tokio::spawn(worker.run())
            })
            .collect();

        info!(workers = size, "worker pool started");
        Self { shutdown, handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Signal every worker to stop and wait for them. Returns the total number
    /// of tasks completed by the pool.
    pub async fn shutdown(self) -> usize {
        let _ = self.shutdown.send(true);
        let mut total = 0;
        for handle in self.handles {
            match handle.await {
                Ok(completed) => total += completed,
                Err(e) => warn!(error = %e, "worker task failed"),
            }
        }
        info!(completed = total, "worker pool stopped");
        total
    }
}
