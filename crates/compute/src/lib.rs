pub mod arith;
pub mod compiler;
pub mod orchestrator;
pub mod scheduler;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use compiler::{compile, validate, CompileError, ExprNode, Operator};
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use scheduler::{RegistryError, RegistryMetrics, ScheduleOutcome, StaleTask, TaskRegistry, TaskScheduler};
pub use store::{ExpressionStore, MemoryExpressionStore, StoredExpression};
