//! Where workers get tasks from and report results to.

use async_trait::async_trait;
use calc_compute::{Orchestrator, OrchestratorError, RegistryError};
use calc_core::{Task, TaskResult, TaskStatusView};

use crate::error::AgentError;

/// Trait for task dispatch backends.
///
/// The HTTP client talks to a remote orchestrator; the orchestrator itself
/// implements it too so a pool can run in-process.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Take the next task. `Ok(None)` means the queue is empty right now.
    async fn next_task(&self) -> Result<Option<Task>, AgentError>;

    /// Dependency lookup. `Ok(None)` means the orchestrator does not know the task.
    async fn task_status(&self, task_id: &str) -> Result<Option<TaskStatusView>, AgentError>;

    /// Report a computed result.
    async fn submit_result(&self, result: &TaskResult) -> Result<(), AgentError>;
}

impl From<OrchestratorError> for AgentError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::Registry(RegistryError::UnknownTask(id)) => AgentError::UnknownTask(id),
            other => AgentError::Orchestrator(other.to_string()),
        }
    }
}

#[async_trait]
impl TaskSource for Orchestrator {
    async fn next_task(&self) -> Result<Option<Task>, AgentError> {
        Ok(Orchestrator::next_task(self)?)
    }

    async fn task_status(&self, task_id: &str) -> Result<Option<TaskStatusView>, AgentError> {
        Ok(Orchestrator::task_status(self, task_id)?)
    }

    async fn submit_result(&self, result: &TaskResult) -> Result<(), AgentError> {
        self.complete_task(&result.id, result.result).await?;
        Ok(())
    }
}
