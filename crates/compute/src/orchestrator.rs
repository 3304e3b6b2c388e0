//! Orchestrator: ties the compiler, the scheduler and the expression store
//! together behind the operations the HTTP layer and in-process workers use.

use std::sync::Arc;
use std::time::Duration;

use calc_core::{CalcError, Expression, ExpressionStatus, OperationTimes, Task, TaskStatusView};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::compiler::{compile, CompileError, ExprNode};
use crate::scheduler::{RegistryError, RegistryMetrics, StaleTask, TaskRegistry, TaskScheduler};
use crate::store::{ExpressionStore, MemoryExpressionStore};

/// Error type for orchestrator operations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("{0}")]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Store(#[from] CalcError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub struct Orchestrator {
    registry: Arc<TaskRegistry>,
    scheduler: TaskScheduler,
    store: Arc<dyn ExpressionStore>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn ExpressionStore>, times: OperationTimes) -> Self {
        let registry = Arc::new(TaskRegistry::new());
        let scheduler = TaskScheduler::new(registry.clone(), times);
        Self { registry, scheduler, store }
    }

    /// Orchestrator with a fresh in-memory expression store.
    pub fn in_memory(times: OperationTimes) -> Self {
        Self::new(Arc::new(MemoryExpressionStore::new()), times)
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn ExpressionStore> {
        &self.store
    }

    /// Accept an expression for evaluation and return its ID.
    ///
    /// Compilation runs before anything is stored, so malformed input is
    /// rejected without side effects. Scheduling continues in a spawned task.
    pub async fn submit(self: &Arc<Self>, owner_id: &str, text: &str) -> Result<String, OrchestratorError> {
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let tree = match compile(&cleaned) {
            Ok(tree) => tree,
            Err(e) => {
                info!(owner = owner_id, error = %e, "expression rejected");
                return Err(e.into());
            }
        };

        let id = Uuid::new_v4().to_string();
        self.store.create_expression(&id, owner_id, &cleaned).await?;
        info!(expression_id = %id, owner = owner_id, expression = %cleaned, "expression accepted");

        let this = Arc::clone(self);
        let expression_id = id.clone();
        tokio::spawn(async move {
            this.process(&expression_id, tree).await;
        });

        Ok(id)
    }

    /// Asynchronous stage of a submission: mark running, then schedule.
    async fn process(&self, expression_id: &str, mut tree: ExprNode) {
        if let Err(e) = self.try_process(expression_id, &mut tree).await {
            error!(expression_id, error = %e, "scheduling failed");
            if let Err(store_err) = self.store.mark_failed(expression_id, &e.to_string()).await {
                error!(expression_id, error = %store_err, "failed to record scheduling failure");
            }
        }
    }

    async fn try_process(&self, expression_id: &str, tree: &mut ExprNode) -> Result<(), OrchestratorError> {
        self.store.update_status(expression_id, ExpressionStatus::Running).await?;

        if let Some(value) = tree.literal_value() {
            info!(expression_id, result = value, "expression has no operators");
            self.store.update_result(expression_id, value).await?;
            return Ok(());
        }

        let outcome = self.scheduler.schedule(tree, expression_id)?;
        self.settle(outcome.final_task).await
    }

    /// A worker may have reported the root task before it was flagged final;
    /// in that case the result is applied here instead of in `complete_task`.
    async fn settle(&self, final_task: Option<Task>) -> Result<(), OrchestratorError> {
        match final_task {
            Some(task) if task.is_done() => self.finish(&task).await,
            _ => Ok(()),
        }
    }

    async fn finish(&self, final_task: &Task) -> Result<(), OrchestratorError> {
        self.store
            .update_result(&final_task.expression_id, final_task.result)
            .await?;
        info!(
            expression_id = %final_task.expression_id,
            task_id = %final_task.id,
            result = final_task.result,
            "final result applied"
        );
        Ok(())
    }

    /// Hand out the queue head, if any.
    pub fn next_task(&self) -> Result<Option<Task>, OrchestratorError> {
        let task = self.registry.dequeue_next()?;
        if let Some(task) = &task {
            debug!(task_id = %task.id, operation = %task.operation, "task dispatched");
        }
        Ok(task)
    }

    pub fn task_status(&self, task_id: &str) -> Result<Option<TaskStatusView>, OrchestratorError> {
        Ok(self.registry.status(task_id)?)
    }

    /// Record a task result; when it belongs to a final task, apply it to the
    /// owning expression.
    pub async fn complete_task(&self, task_id: &str, value: f64) -> Result<Task, OrchestratorError> {
        let task = self.registry.record_result(task_id, value)?;
        debug!(task_id, result = value, is_final = task.is_final, "task completed");
        if task.is_final {
            self.finish(&task).await?;
        }
        Ok(task)
    }

    /// Look up an expression. Records of other owners are reported as absent.
    pub async fn expression(&self, id: &str, owner_id: &str) -> Result<Option<Expression>, OrchestratorError> {
        Ok(self
            .store
            .get_by_id(id, owner_id)
            .await?
            .map(|stored| stored.expression))
    }

    pub async fn expressions(&self, owner_id: &str) -> Result<Vec<Expression>, OrchestratorError> {
        Ok(self
            .store
            .list_by_owner(owner_id)
            .await?
            .into_iter()
            .map(|stored| stored.expression)
            .collect())
    }

    pub fn metrics(&self) -> Result<RegistryMetrics, OrchestratorError> {
        Ok(self.registry.metrics()?)
    }

    /// Dispatched tasks without a result for longer than `older_than`, logged
    /// at warn level.
    pub fn stale_tasks(&self, older_than: Duration) -> Result<Vec<StaleTask>, OrchestratorError> {
        let stale = self.registry.stale_dispatched(older_than)?;
        for task in &stale {
            warn!(
                task_id = %task.task_id,
                expression_id = %task.expression_id,
                age_ms = task.age_ms,
                "task dispatched without a result"
            );
        }
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::arith;
    use crate::store::StoredExpression;

    /// Memory store that counts how often a final result is applied.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryExpressionStore,
        results: AtomicUsize,
    }

    impl CountingStore {
        fn results(&self) -> usize {
            self.results.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExpressionStore for CountingStore {
        async fn create_expression(&self, id: &str, owner_id: &str, text: &str) -> Result<Expression, CalcError> {
            self.inner.create_expression(id, owner_id, text).await
        }

        async fn update_status(&self, id: &str, status: ExpressionStatus) -> Result<(), CalcError> {
            self.inner.update_status(id, status).await
        }

        async fn update_result(&self, id: &str, result: f64) -> Result<(), CalcError> {
            self.results.fetch_add(1, Ordering::SeqCst);
            self.inner.update_result(id, result).await
        }

        async fn mark_failed(&self, id: &str, reason: &str) -> Result<(), CalcError> {
            self.inner.mark_failed(id, reason).await
        }

        async fn get_by_id(&self, id: &str, owner_id: &str) -> Result<Option<StoredExpression>, CalcError> {
            self.inner.get_by_id(id, owner_id).await
        }

        async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoredExpression>, CalcError> {
            self.inner.list_by_owner(owner_id).await
        }
    }

    fn orchestrator() -> Arc<Orchestrator> {
        Arc::new(Orchestrator::in_memory(OperationTimes::instant()))
    }

    async fn wait_for_status(orch: &Orchestrator, id: &str, owner: &str, status: ExpressionStatus) -> Expression {
        for _ in 0..200 {
            if let Some(e) = orch.expression(id, owner).await.unwrap() {
                if e.status == status {
                    return e;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expression {id} never reached {status}");
    }

    /// Wait until the spawned stage has flagged the expression's final task.
    async fn wait_scheduled(orch: &Orchestrator, id: &str) {
        for _ in 0..200 {
            let tasks = orch.registry().tasks_for_expression(id).unwrap();
            if tasks.iter().any(|t| t.is_final) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expression {id} was never scheduled");
    }

    /// Execute everything currently queued, in order.
    async fn drain(orch: &Orchestrator) {
        while let Some(mut task) = orch.next_task().unwrap() {
            for dep in task.dependencies.clone() {
                let status = orch.task_status(&dep.task_id).unwrap().unwrap();
                task.fill(dep.slot, status.result.unwrap());
            }
            orch.complete_task(&task.id, arith::execute(&task)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn submit_and_evaluate() {
        let orch = orchestrator();
        let id = orch.submit("alice", " 2 + 3 * 4 ").await.unwrap();
        wait_scheduled(&orch, &id).await;

        drain(&orch).await;
        let e = wait_for_status(&orch, &id, "alice", ExpressionStatus::Done).await;
        assert_eq!(e.result, 14.0);

        let stored = orch.store().get_by_id(&id, "alice").await.unwrap().unwrap();
        assert_eq!(stored.text, "2+3*4");
    }

    #[tokio::test]
    async fn compile_error_stores_nothing() {
        let orch = orchestrator();
        let err = orch.submit("alice", "1++2").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Compile(_)));
        assert!(orch.expressions("alice").await.unwrap().is_empty());
        assert_eq!(orch.metrics().unwrap().total, 0);
    }

    #[tokio::test]
    async fn bare_literal_is_done_without_tasks() {
        let orch = orchestrator();
        let id = orch.submit("alice", "42.5").await.unwrap();
        let e = wait_for_status(&orch, &id, "alice", ExpressionStatus::Done).await;
        assert_eq!(e.result, 42.5);
        assert!(orch.next_task().unwrap().is_none());
    }

    #[tokio::test]
    async fn division_by_zero_completes() {
        let orch = orchestrator();
        let id = orch.submit("alice", "1/0").await.unwrap();
        wait_scheduled(&orch, &id).await;
        drain(&orch).await;
        let e = wait_for_status(&orch, &id, "alice", ExpressionStatus::Done).await;
        assert_eq!(e.result, 0.0);
    }

    #[tokio::test]
    async fn non_final_results_do_not_touch_expression() {
        let orch = orchestrator();
        let id = orch.submit("alice", "(1+2)*3").await.unwrap();
        wait_scheduled(&orch, &id).await;

        let first = orch.next_task().unwrap().unwrap();
        assert!(!first.is_final);
        orch.complete_task(&first.id, 3.0).await.unwrap();

        let e = orch.expression(&id, "alice").await.unwrap().unwrap();
        assert_eq!(e.status, ExpressionStatus::Running);
        assert_eq!(e.result, 0.0);
    }

    #[tokio::test]
    async fn other_owner_cannot_see_expression() {
        let orch = orchestrator();
        let id = orch.submit("alice", "1+1").await.unwrap();
        assert!(orch.expression(&id, "bob").await.unwrap().is_none());
        assert!(orch.expressions("bob").await.unwrap().is_empty());
        assert_eq!(orch.expressions("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_task_result_rejected() {
        let orch = orchestrator();
        let err = orch.complete_task("999", 1.0).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Registry(RegistryError::UnknownTask(_))));
    }

    #[tokio::test]
    async fn stale_tasks_reported() {
        let orch = orchestrator();
        let id = orch.submit("alice", "1+2").await.unwrap();
        wait_scheduled(&orch, &id).await;
        let task = orch.next_task().unwrap().unwrap();

        let stale = orch.stale_tasks(Duration::ZERO).unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].task_id, task.id);
        assert_eq!(stale[0].expression_id, id);
    }

    #[tokio::test]
    async fn root_reported_before_final_flag_finishes_once() {
        let store = Arc::new(CountingStore::default());
        let orch = Orchestrator::new(store.clone(), OperationTimes::instant());
        store.create_expression("e1", "alice", "1+2").await.unwrap();
        store.update_status("e1", ExpressionStatus::Running).await.unwrap();

        let mut tree = compile("1+2").unwrap();
        orch.scheduler.enqueue_tree(&mut tree, "e1").unwrap();

        // The worker is faster than the final flag.
        let root = orch.next_task().unwrap().unwrap();
        let reported = orch.complete_task(&root.id, 3.0).await.unwrap();
        assert!(!reported.is_final);
        assert_eq!(store.results(), 0);

        let final_task = orch.scheduler.flag_final(&tree).unwrap();
        assert!(final_task.as_ref().is_some_and(|t| t.is_done()));
        orch.settle(final_task).await.unwrap();

        let e = orch.expression("e1", "alice").await.unwrap().unwrap();
        assert_eq!(e.status, ExpressionStatus::Done);
        assert_eq!(e.result, 3.0);
        assert_eq!(store.results(), 1);
    }

    #[tokio::test]
    async fn final_flag_before_result_finishes_once() {
        let store = Arc::new(CountingStore::default());
        let orch = Arc::new(Orchestrator::new(store.clone(), OperationTimes::instant()));
        let id = orch.submit("alice", "(1+2)*3").await.unwrap();
        wait_scheduled(&orch, &id).await;
        assert_eq!(store.results(), 0);

        drain(&orch).await;
        let e = wait_for_status(&orch, &id, "alice", ExpressionStatus::Done).await;
        assert_eq!(e.result, 9.0);
        assert_eq!(store.results(), 1);
    }

    #[tokio::test]
    async fn scheduling_failure_marks_expression_failed() {
        let orch = orchestrator();
        orch.registry().poison();

        let id = orch.submit("alice", "1+2").await.unwrap();
        let e = wait_for_status(&orch, &id, "alice", ExpressionStatus::Failed).await;
        let reason = e.error.unwrap();
        assert!(reason.contains("Lock poisoned"), "unexpected reason {reason:?}");
        assert_eq!(e.result, 0.0);
    }

    #[tokio::test]
    async fn deep_expression_does_not_take_down_the_runtime() {
        let orch = orchestrator();
        let expr = format!("{}1", "1+".repeat(50_000));
        let id = orch.submit("alice", &expr).await.unwrap();
        wait_scheduled(&orch, &id).await;
        assert_eq!(orch.metrics().unwrap().queue_depth, 50_000);
    }
}
