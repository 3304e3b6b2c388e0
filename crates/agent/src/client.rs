//! HTTP client for the orchestrator's internal dispatch endpoints.

use std::time::Duration;

use async_trait::async_trait;
use calc_core::{Task, TaskResult, TaskStatusView};
use reqwest::StatusCode;

use crate::error::AgentError;
use crate::source::TaskSource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for `GET/POST /internal/task` and `GET /internal/task/{id}`.
pub struct OrchestratorClient {
    base_url: String,
    http: reqwest::Client,
}

impl OrchestratorClient {
    pub fn new(base_url: &str) -> Result<Self, AgentError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the orchestrator answers `/health`.
    pub async fn health_check(&self) -> Result<(), AgentError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.http.get(&url).send().await?;
        ensure_success(resp).await.map(|_| ())
    }
}

/// Turn a non-2xx response into `UnexpectedStatus` with the body text.
async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, AgentError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(AgentError::UnexpectedStatus { status, body })
}

#[async_trait]
impl TaskSource for OrchestratorClient {
    async fn next_task(&self) -> Result<Option<Task>, AgentError> {
        let url = format!("{}/internal/task", self.base_url);
        let resp = self.http.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let task = ensure_success(resp).await?.json::<Task>().await?;
        Ok(Some(task))
    }

    async fn task_status(&self, task_id: &str) -> Result<Option<TaskStatusView>, AgentError> {
        let url = format!("{}/internal/task/{}", self.base_url, task_id);
        let resp = self.http.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = ensure_success(resp).await?.json::<TaskStatusView>().await?;
        Ok(Some(status))
    }

    async fn submit_result(&self, result: &TaskResult) -> Result<(), AgentError> {
        let url = format!("{}/internal/task", self.base_url);
        let resp = self.http.post(&url).json(result).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AgentError::UnknownTask(result.id.clone()));
        }
        ensure_success(resp).await?;
        Ok(())
    }
}
