//! Task-graph scheduler: turns an expression tree into dependency-linked
//! tasks and keeps them in a shared registry with a FIFO dispatch queue.
//!
//! - `registry`: lock-guarded task map, ID counter and dispatch queue
//! - `planner`: postorder walk that materializes one task per operator node
//! - `metrics`: queue depth and task age snapshots
//! - `types`: per-operator durations and scheduler errors

pub mod metrics;
pub mod planner;
pub mod registry;
pub mod types;


pub use metrics::{RegistryMetrics, StaleTask};
pub use planner::{ScheduleOutcome, TaskScheduler};
pub use registry::TaskRegistry;
pub use types::{operation_time, RegistryError};
