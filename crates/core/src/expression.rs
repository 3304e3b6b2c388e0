use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a submitted expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionStatus {
    /// Accepted and stored, not yet scheduled.
    Queued,
    /// Tasks are in the registry; waiting for the final result.
    Running,
    /// The final task reported; `result` holds the answer.
    Done,
    /// Scheduling aborted; `error` holds the reason.
    Failed,
}

impl ExpressionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExpressionStatus::Done | ExpressionStatus::Failed)
    }
}

impl fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExpressionStatus::Queued => "queued",
            ExpressionStatus::Running => "running",
            ExpressionStatus::Done => "done",
            ExpressionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Public view of an expression, as returned by the status API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Expression {
    pub id: String,
    pub status: ExpressionStatus,
    pub result: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/v1/calculate`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExpressionInput {
    pub expression: String,
}

/// Response to a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ExpressionStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let back: ExpressionStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(back, ExpressionStatus::Failed);
    }

    #[test]
    fn error_field_omitted_when_absent() {
        let expr = Expression {
            id: "e1".into(),
            status: ExpressionStatus::Done,
            result: 14.0,
            error: None,
        };
        let value = serde_json::to_value(&expr).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["result"], 14.0);
    }

    #[test]
    fn terminal_states() {
        assert!(!ExpressionStatus::Queued.is_terminal());
        assert!(!ExpressionStatus::Running.is_terminal());
        assert!(ExpressionStatus::Done.is_terminal());
        assert!(ExpressionStatus::Failed.is_terminal());
    }
}
