//! Agent error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("orchestrator returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("task not found: {0}")]
    UnknownTask(String),

    #[error("orchestrator error: {0}")]
    Orchestrator(String),

    #[error("shutdown requested")]
    Shutdown,
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AgentError::Decode(e.to_string())
        } else {
            AgentError::Transport(e.to_string())
        }
    }
}
