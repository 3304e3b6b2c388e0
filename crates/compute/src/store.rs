//! Expression record storage.

use std::collections::HashMap;

use async_trait::async_trait;
use calc_core::{CalcError, Expression, ExpressionStatus};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

/// An expression record together with its owner and bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredExpression {
    pub owner_id: String,
    /// Submitted text with whitespace removed.
    pub text: String,
    pub expression: Expression,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trait for expression storage backends.
///
/// Records never move out of a terminal state: once `done` or `failed`, later
/// updates are ignored.
#[async_trait]
pub trait ExpressionStore: Send + Sync {
    /// Insert a new record in `queued` state.
    async fn create_expression(&self, id: &str, owner_id: &str, text: &str) -> Result<Expression, CalcError>;

    async fn update_status(&self, id: &str, status: ExpressionStatus) -> Result<(), CalcError>;

    /// Store the final value and move the record to `done`.
    async fn update_result(&self, id: &str, result: f64) -> Result<(), CalcError>;

    /// Move the record to `failed` with a reason.
    async fn mark_failed(&self, id: &str, reason: &str) -> Result<(), CalcError>;

    /// A record owned by `owner_id`. Records of other owners are absent.
    async fn get_by_id(&self, id: &str, owner_id: &str) -> Result<Option<StoredExpression>, CalcError>;

    /// All records of one owner, oldest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoredExpression>, CalcError>;
}

/// Process-local store backed by a map behind an async lock.
#[derive(Default)]
pub struct MemoryExpressionStore {
    records: RwLock<HashMap<String, StoredExpression>>,
}

impl MemoryExpressionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, id: &str, apply: F) -> Result<(), CalcError>
    where
        F: FnOnce(&mut Expression) + Send,
    {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| CalcError::ExpressionNotFound(id.to_string()))?;
        if record.expression.status.is_terminal() {
            debug!(expression_id = %id, status = %record.expression.status, "update after terminal state ignored");
            return Ok(());
        }
        apply(&mut record.expression);
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ExpressionStore for MemoryExpressionStore {
    async fn create_expression(&self, id: &str, owner_id: &str, text: &str) -> Result<Expression, CalcError> {
        let mut records = self.records.write().await;
        if records.contains_key(id) {
            return Err(CalcError::Storage(format!("duplicate expression id {}", id)));
        }
        let expression = Expression {
            id: id.to_string(),
            status: ExpressionStatus::Queued,
            result: 0.0,
            error: None,
        };
        let now = Utc::now();
        records.insert(
            id.to_string(),
            StoredExpression {
                owner_id: owner_id.to_string(),
                text: text.to_string(),
                expression: expression.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(expression)
    }

    async fn update_status(&self, id: &str, status: ExpressionStatus) -> Result<(), CalcError> {
        self.modify(id, |e| e.status = status).await
    }

    async fn update_result(&self, id: &str, result: f64) -> Result<(), CalcError> {
        self.modify(id, |e| {
            e.result = result;
            e.status = ExpressionStatus::Done;
        })
        .await
    }

    async fn mark_failed(&self, id: &str, reason: &str) -> Result<(), CalcError> {
        let reason = reason.to_string();
        self.modify(id, move |e| {
            e.status = ExpressionStatus::Failed;
            e.error = Some(reason);
        })
        .await
    }

    async fn get_by_id(&self, id: &str, owner_id: &str) -> Result<Option<StoredExpression>, CalcError> {
        Ok(self
            .records
            .read()
            .await
            .get(id)
            .filter(|record| record.owner_id == owner_id)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoredExpression>, CalcError> {
        let records = self.records.read().await;
        let mut owned: Vec<StoredExpression> = records.values().filter(|r| r.owner_id == owner_id).cloned().collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.expression.id.cmp(&b.expression.id)));
        Ok(owned)
    }
}
