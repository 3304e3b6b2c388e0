//! Worker pool that pulls tasks from the orchestrator, resolves their
//! dependencies, computes them and reports the results.

pub mod client;
pub mod error;
pub mod pool;
pub mod source;
pub mod worker;


pub use client::OrchestratorClient;
pub use error::AgentError;
pub use pool::WorkerPool;
pub use source::TaskSource;
pub use worker::{Worker, WorkerSettings};
