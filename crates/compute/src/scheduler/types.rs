use calc_core::OperationTimes;

use crate::compiler::Operator;

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Task not found: {0}")]
    UnknownTask(String),
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Expected duration of one operation, in milliseconds.
pub fn operation_time(times: &OperationTimes, op: Operator) -> u64 {
    match op {
        Operator::Add => times.addition_ms,
        Operator::Sub => times.subtraction_ms,
        Operator::Mul => times.multiplication_ms,
        Operator::Div => times.division_ms,
        Operator::Neg => times.negation_ms,
    }
}
