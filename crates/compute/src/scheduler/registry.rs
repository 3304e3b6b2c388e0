use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use calc_core::{Task, TaskId, TaskState, TaskStatusView};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::metrics::{age_ms, RegistryMetrics, StaleTask};
use super::types::RegistryError;

struct TaskEntry {
    task: Task,
    enqueued_at: DateTime<Utc>,
    dispatched_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    tasks: HashMap<TaskId, TaskEntry>,
    queue: VecDeque<TaskId>,
}

/// Authoritative task store plus FIFO dispatch queue.
///
/// The ID counter, the task map and the queue share one mutex, so every
/// operation below is a single critical section. Workers resolve
/// dependencies through [`TaskRegistry::status`], never through a private copy.
#[derive(Default)]
pub struct TaskRegistry {
    inner: Mutex<RegistryInner>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryInner>, RegistryError> {
        self.inner
            .lock()
            .map_err(|e| RegistryError::LockPoisoned(format!("task registry: {}", e)))
    }

    /// Poison the lock the way a panicking holder would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.inner.lock();
            panic!("task registry poisoned on purpose");
        }));
    }

    /// Allocate the next task ID, build the task with it, store it and append
    /// it to the tail of the queue, all under one lock.
    pub fn enqueue_with<F>(&self, build: F) -> Result<Task, RegistryError>
    where
        F: FnOnce(TaskId) -> Task,
    {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let id = inner.next_id.to_string();
        let task = build(id.clone());
        inner.tasks.insert(
            id.clone(),
            TaskEntry { task: task.clone(), enqueued_at: Utc::now(), dispatched_at: None },
        );
        inner.queue.push_back(id);
        Ok(task)
    }

    /// Pop the queue head. `None` means "no task right now", not an error.
    pub fn dequeue_next(&self) -> Result<Option<Task>, RegistryError> {
        let mut inner = self.lock()?;
        while let Some(id) = inner.queue.pop_front() {
            if let Some(entry) = inner.tasks.get_mut(&id) {
                entry.task.status = TaskState::Dispatched;
                entry.dispatched_at = Some(Utc::now());
                return Ok(Some(entry.task.clone()));
            }
        }
        Ok(None)
    }

    /// Mark a task done with its result. Returns the updated task.
    pub fn record_result(&self, id: &str, value: f64) -> Result<Task, RegistryError> {
        let mut inner = self.lock()?;
        let entry = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownTask(id.to_string()))?;
        if entry.task.is_done() {
            debug!(task_id = %id, "result reported again, overwriting");
        }
        entry.task.status = TaskState::Done;
        entry.task.result = value;
        Ok(entry.task.clone())
    }

    /// Flag a task as its expression's final task. Returns the updated task,
    /// which may already be done if a worker was quick.
    pub fn mark_final(&self, id: &str) -> Result<Task, RegistryError> {
        let mut inner = self.lock()?;
        let entry = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownTask(id.to_string()))?;
        entry.task.is_final = true;
        Ok(entry.task.clone())
    }

    /// Dependency lookup. `None` for an unknown ID.
    pub fn status(&self, id: &str) -> Result<Option<TaskStatusView>, RegistryError> {
        let inner = self.lock()?;
        Ok(inner.tasks.get(id).map(|entry| {
            let done = entry.task.is_done();
            TaskStatusView {
                id: entry.task.id.clone(),
                done,
                result: done.then_some(entry.task.result),
            }
        }))
    }

    pub fn get(&self, id: &str) -> Result<Option<Task>, RegistryError> {
        Ok(self.lock()?.tasks.get(id).map(|entry| entry.task.clone()))
    }

    /// All tasks of one expression in creation order.
    pub fn tasks_for_expression(&self, expression_id: &str) -> Result<Vec<Task>, RegistryError> {
        let inner = self.lock()?;
        let mut tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|entry| entry.task.expression_id == expression_id)
            .map(|entry| entry.task.clone())
            .collect();
        tasks.sort_by_key(|t| t.id.parse::<u64>().unwrap_or(u64::MAX));
        Ok(tasks)
    }

    /// IDs currently waiting in the queue, head first.
    pub fn queued_ids(&self) -> Result<Vec<TaskId>, RegistryError> {
        Ok(self.lock()?.queue.iter().cloned().collect())
    }

    pub fn metrics(&self) -> Result<RegistryMetrics, RegistryError> {
        let inner = self.lock()?;
        let now = Utc::now();
        let mut m = RegistryMetrics {
            total: inner.tasks.len(),
            queue_depth: inner.queue.len(),
            ..RegistryMetrics::default()
        };

        for entry in inner.tasks.values() {
            match entry.task.status {
                TaskState::Pending => m.pending += 1,
                TaskState::Dispatched => {
                    m.dispatched += 1;
                    if let Some(at) = entry.dispatched_at {
                        let age = age_ms(at, now);
                        m.oldest_dispatched_age_ms = Some(m.oldest_dispatched_age_ms.map_or(age, |a| a.max(age)));
                    }
                }
                TaskState::Done => m.done += 1,
            }
        }

        m.oldest_queued_age_ms = inner
            .queue
            .front()
            .and_then(|id| inner.tasks.get(id))
            .map(|entry| age_ms(entry.enqueued_at, now));

        Ok(m)
    }

    /// Tasks dispatched longer ago than `older_than` that never reported.
    pub fn stale_dispatched(&self, older_than: Duration) -> Result<Vec<StaleTask>, RegistryError> {
        let inner = self.lock()?;
        let now = Utc::now();
        let threshold = older_than.as_millis() as u64;
        let mut stale: Vec<StaleTask> = inner
            .tasks
            .values()
            .filter(|entry| entry.task.status == TaskState::Dispatched)
            .filter_map(|entry| {
                let at = entry.dispatched_at?;
                let age = age_ms(at, now);
                (age >= threshold).then(|| StaleTask {
                    task_id: entry.task.id.clone(),
                    expression_id: entry.task.expression_id.clone(),
                    dispatched_at: at,
                    age_ms: age,
                })
            })
            .collect();
        stale.sort_by(|a, b| b.age_ms.cmp(&a.age_ms));
        Ok(stale)
    }
}
