use serde::{Deserialize, Serialize};

/// Task identifier. Monotonic per registry, rendered as a decimal string.
pub type TaskId = String;

/// Dispatch state of a task inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Queued, not yet handed to a worker.
    Pending,
    /// Handed to a worker; no result yet. Nothing tracks which worker.
    Dispatched,
    /// Result recorded.
    Done,
}

/// Which operand of a task a dependency supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperandSlot {
    Arg1,
    Arg2,
}

/// A task whose result fills one operand slot of the dependent task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Dependency {
    pub task_id: TaskId,
    pub slot: OperandSlot,
}

/// One atomic arithmetic operation, as stored in the registry and sent to workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Task {
    pub id: TaskId,
    pub arg1: f64,
    pub arg2: f64,
    /// Operator symbol: `+`, `-`, `*`, `/` or `u-`.
    pub operation: String,
    #[serde(rename = "operation_time")]
    pub operation_time_ms: f64,
    /// Left-to-right; at most two entries.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    pub expression_id: String,
    #[serde(default)]
    pub is_final: bool,
    pub status: TaskState,
    #[serde(default)]
    pub result: f64,
}

impl Task {
    /// Write a resolved dependency value into its operand slot.
    pub fn fill(&mut self, slot: OperandSlot, value: f64) {
        match slot {
            OperandSlot::Arg1 => self.arg1 = value,
            OperandSlot::Arg2 => self.arg2 = value,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskState::Done
    }
}

/// Body of `POST /internal/task`: the computed value of one task.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TaskResult {
    pub id: TaskId,
    pub result: f64,
}

/// Answer to a dependency lookup (`GET /internal/task/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TaskStatusView {
    pub id: TaskId,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task {
            id: "2".into(),
            arg1: 2.0,
            arg2: 0.0,
            operation: "+".into(),
            operation_time_ms: 5.0,
            dependencies: vec![Dependency { task_id: "1".into(), slot: OperandSlot::Arg2 }],
            expression_id: "expr".into(),
            is_final: true,
            status: TaskState::Pending,
            result: 0.0,
        }
    }

    #[test]
    fn fill_targets_named_slot() {
        let mut task = sample();
        task.fill(OperandSlot::Arg2, 12.0);
        assert_eq!(task.arg1, 2.0);
        assert_eq!(task.arg2, 12.0);
    }

    #[test]
    fn wire_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["operation_time"], 5.0);
        assert_eq!(value["dependencies"][0]["slot"], "arg2");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["is_final"], true);
    }

    #[test]
    fn status_view_omits_missing_result() {
        let view = TaskStatusView { id: "1".into(), done: false, result: None };
        let json = serde_json::to_string(&view).unwrap();
        assert_eq!(json, r#"{"id":"1","done":false}"#);
    }
}
