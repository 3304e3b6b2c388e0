//! A single polling worker.
//!
//! Each worker handles one task at a time: it waits for the task's
//! dependencies through the shared [`TaskSource`], fills the operand slots,
//! computes, and reports the result. Dependency values always come from the
//! source, never from what this worker computed earlier.

use std::sync::Arc;
use std::time::Duration;

use calc_compute::arith;
use calc_core::config::AgentConfig;
use calc_core::{Dependency, Task, TaskResult};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::AgentError;
use crate::source::TaskSource;

/// Timing knobs shared by every worker of a pool.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Wait after an empty queue, a transport failure or a rejected submission.
    pub poll_interval: Duration,
    /// Wait between two status checks of an unfinished dependency.
    pub dependency_backoff: Duration,
    /// Sleep for the task's `operation_time` before computing it.
    pub simulate_duration: bool,
}

impl From<&AgentConfig> for WorkerSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            dependency_backoff: config.dependency_backoff(),
            simulate_duration: config.simulate_duration,
        }
    }
}

pub struct Worker {
    id: usize,
    source: Arc<dyn TaskSource>,
    settings: WorkerSettings,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    pub fn new(
        id: usize,
        source: Arc<dyn TaskSource>,
        settings: WorkerSettings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self { id, source, settings, shutdown }
    }

    /// Poll loop. Returns the number of tasks completed once shutdown is
    /// requested.
    pub async fn run(mut self) -> usize {
        info!(worker = self.id, "worker started");
        let mut completed = 0;

        while !self.stopping() {
            let next = self.source.next_task().await;
            match next {
                Ok(Some(task)) => match self.process(task).await {
                    Ok(_) => completed += 1,
                    Err(AgentError::Shutdown) => break,
                    Err(e) => error!(worker = self.id, error = %e, "task abandoned"),
                },
                Ok(None) => {
                    if self.pause(self.settings.poll_interval).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!(worker = self.id, error = %e, "failed to fetch task");
                    if self.pause(self.settings.poll_interval).await {
                        break;
                    }
                }
            }
        }

        info!(worker = self.id, completed, "worker stopped");
        completed
    }

    /// Resolve, compute and report one task. Returns the computed value.
    ///
    /// Dependency waits are unbounded; only a shutdown request ends them.
    pub async fn process(&mut self, mut task: Task) -> Result<f64, AgentError> {
        debug!(worker = self.id, task_id = %task.id, operation = %task.operation, "task received");

        for dep in task.dependencies.clone() {
            let value = self.await_dependency(&task.id, &dep).await?;
            task.fill(dep.slot, value);
        }

        if self.settings.simulate_duration && task.operation_time_ms > 0.0 {
            tokio::time::sleep(Duration::from_millis(task.operation_time_ms as u64)).await;
        }

        let value = arith::execute(&task);
        debug!(
            worker = self.id,
            task_id = %task.id,
            arg1 = task.arg1,
            arg2 = task.arg2,
            result = value,
            "task computed"
        );

        self.report(TaskResult { id: task.id.clone(), result: value }).await?;
        if task.is_final {
            info!(worker = self.id, task_id = %task.id, expression_id = %task.expression_id, result = value, "final task reported");
        }
        Ok(value)
    }

    async fn await_dependency(&mut self, task_id: &str, dep: &Dependency) -> Result<f64, AgentError> {
        loop {
            match self.source.task_status(&dep.task_id).await {
                Ok(Some(status)) => {
                    if let (true, Some(value)) = (status.done, status.result) {
                        return Ok(value);
                    }
                    debug!(worker = self.id, task_id, dependency = %dep.task_id, "waiting for dependency");
                }
                Ok(None) => warn!(worker = self.id, task_id, dependency = %dep.task_id, "dependency unknown to orchestrator"),
                Err(e) => warn!(worker = self.id, task_id, error = %e, "dependency lookup failed"),
            }
            if self.pause(self.settings.dependency_backoff).await {
                return Err(AgentError::Shutdown);
            }
        }
    }

    /// Submit until accepted. An unknown task is not retried.
    async fn report(&mut self, result: TaskResult) -> Result<(), AgentError> {
        loop {
            match self.source.submit_result(&result).await {
                Ok(()) => return Ok(()),
                Err(e @ AgentError::UnknownTask(_)) => return Err(e),
                Err(e) => warn!(worker = self.id, task_id = %result.id, error = %e, "result submission failed, retrying"),
            }
            if self.pause(self.settings.poll_interval).await {
                return Err(AgentError::Shutdown);
            }
        }
    }

    fn stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleep for `duration` unless shutdown is requested first. Returns `true`
    /// when the worker should stop.
    async fn pause(&mut self, duration: Duration) -> bool {
        if self.stopping() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            changed = self.shutdown.changed() => changed.is_err() || *self.shutdown.borrow(),
        }
    }
}
