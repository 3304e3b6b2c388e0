//! The arithmetic a worker performs for one task.

use calc_core::Task;
use tracing::warn;

/// Apply `operation` to resolved operands.
///
/// Division by zero and unknown operators both yield `0.0`; the task still
/// completes so the expression can finish.
pub fn apply(operation: &str, arg1: f64, arg2: f64) -> f64 {
    match operation {
        "+" => arg1 + arg2,
        "-" => arg1 - arg2,
        "*" => arg1 * arg2,
        "/" if arg2 == 0.0 => {
            warn!(arg1, "division by zero, result forced to 0");
            0.0
        }
        "/" => arg1 / arg2,
        "u-" => -arg1,
        other => {
            warn!(operation = other, "unknown operation, result forced to 0");
            0.0
        }
    }
}

/// Compute a task whose dependency slots have already been filled.
pub fn execute(task: &Task) -> f64 {
    apply(&task.operation, task.arg1, task.arg2)
}
