use std::sync::Arc;

use calc_core::{Dependency, OperandSlot, OperationTimes, Task, TaskState};
use tracing::{debug, info};

use crate::compiler::{ExprNode, NodeKind, NodeState, OperandSource, Operator};

use super::registry::TaskRegistry;
use super::types::{operation_time, RegistryError};

/// Tasks created by one [`TaskScheduler::schedule`] call.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOutcome {
    /// In creation order, which is also their queue order.
    pub tasks: Vec<Task>,
    /// The root's task after it was flagged final. `None` for a bare literal.
    pub final_task: Option<Task>,
}

/// Walks expression trees and materializes their tasks into a registry.
///
/// Each instance owns its registry handle, so independent schedulers (one per
/// test, say) never share counters or queues.
#[derive(Clone)]
pub struct TaskScheduler {
    registry: Arc<TaskRegistry>,
    times: OperationTimes,
}

impl TaskScheduler {
    pub fn new(registry: Arc<TaskRegistry>, times: OperationTimes) -> Self {
        Self { registry, times }
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Schedule every operator node of `root` in postorder, then flag the
    /// root's task final.
    ///
    /// Children are always scheduled before their parent, so queue order is a
    /// valid topological order. Nodes already carrying a task are skipped.
    pub fn schedule(&self, root: &mut ExprNode, expression_id: &str) -> Result<ScheduleOutcome, RegistryError> {
        let mut outcome = ScheduleOutcome {
            tasks: self.enqueue_tree(root, expression_id)?,
            final_task: None,
        };

        if let Some(final_task) = self.flag_final(root)? {
            if let Some(created) = outcome.tasks.iter_mut().find(|t| t.id == final_task.id) {
                created.is_final = true;
            }
            info!(
                expression_id,
                tasks = outcome.tasks.len(),
                final_task = %final_task.id,
                "expression scheduled"
            );
            outcome.final_task = Some(final_task);
        }

        Ok(outcome)
    }

    /// Flag the task of an already scheduled root as final. Returns the
    /// registry's copy, which is already done if a worker reported it first.
    /// `None` when the root has no task.
    pub fn flag_final(&self, root: &ExprNode) -> Result<Option<Task>, RegistryError> {
        match &root.state {
            NodeState::Scheduled(id) => Ok(Some(self.registry.mark_final(id)?)),
            NodeState::Unscheduled => Ok(None),
        }
    }

    /// Enqueue a task for every ready operator node without flagging the root.
    /// Postorder over an explicit stack, so tree depth never turns into call
    /// depth.
    pub fn enqueue_tree(&self, root: &mut ExprNode, expression_id: &str) -> Result<Vec<Task>, RegistryError> {
        let mut created = Vec::new();
        let mut steps = flatten(root);

        // Reversed right-first preorder is left-first postorder.
        for index in (0..steps.len()).rev() {
            let step = &mut steps[index];
            let existing = match &*step.state {
                NodeState::Scheduled(id) => Some(id.clone()),
                NodeState::Unscheduled => None,
            };
            let task_id = match (existing, step.ready_operands()) {
                (Some(id), _) => Some(id),
                (None, Some(operands)) => {
                    let task = self.enqueue(step.op, operands, expression_id)?;
                    let id = task.id.clone();
                    *step.state = NodeState::Scheduled(id.clone());
                    created.push(task);
                    Some(id)
                }
                (None, None) => None,
            };

            if let (Some(id), Some((parent, slot))) = (task_id, step.parent) {
                steps[parent].resolve(slot, OperandSource::Task(id));
            }
        }
        Ok(created)
    }

    fn enqueue(
        &self,
        op: Operator,
        operands: Vec<(OperandSlot, OperandSource)>,
        expression_id: &str,
    ) -> Result<Task, RegistryError> {
        let mut arg1 = 0.0;
        let mut arg2 = 0.0;
        let mut dependencies = Vec::with_capacity(2);
        for (slot, source) in operands {
            match source {
                OperandSource::Value(v) => match slot {
                    OperandSlot::Arg1 => arg1 = v,
                    OperandSlot::Arg2 => arg2 = v,
                },
                OperandSource::Task(task_id) => dependencies.push(Dependency { task_id, slot }),
            }
        }

        let duration = operation_time(&self.times, op);
        let task = self.registry.enqueue_with(|id| Task {
            id,
            arg1,
            arg2,
            operation: op.symbol().to_string(),
            operation_time_ms: duration as f64,
            dependencies,
            expression_id: expression_id.to_string(),
            is_final: false,
            status: TaskState::Pending,
            result: 0.0,
        })?;

        debug!(
            task_id = %task.id,
            operation = %task.operation,
            dependencies = task.dependencies.len(),
            "task enqueued"
        );
        Ok(task)
    }
}

/// One operator node of the tree, detached from its children.
struct Step<'a> {
    op: Operator,
    state: &'a mut NodeState,
    parent: Option<(usize, OperandSlot)>,
    operands: Vec<(OperandSlot, Option<OperandSource>)>,
}

impl Step<'_> {
    fn resolve(&mut self, slot: OperandSlot, source: OperandSource) {
        if let Some((_, pending)) = self.operands.iter_mut().find(|(s, _)| *s == slot) {
            *pending = Some(source);
        }
    }

    /// Every operand, or `None` while a child has no task yet.
    fn ready_operands(&self) -> Option<Vec<(OperandSlot, OperandSource)>> {
        self.operands
            .iter()
            .map(|(slot, source)| source.clone().map(|s| (*slot, s)))
            .collect()
    }
}

/// Operator nodes in right-first preorder. Literal and already scheduled
/// children resolve immediately; other children are recorded with a link back
/// to their parent's operand slot.
fn flatten(root: &mut ExprNode) -> Vec<Step<'_>> {
    let mut steps = Vec::new();
    let mut stack: Vec<(&mut ExprNode, Option<(usize, OperandSlot)>)> = vec![(root, None)];

    while let Some((node, parent)) = stack.pop() {
        let ExprNode { kind, state } = node;
        let (op, children) = match kind {
            NodeKind::Literal(_) => continue,
            NodeKind::Unary { op, operand } => (*op, vec![(OperandSlot::Arg1, &mut **operand)]),
            NodeKind::Binary { op, left, right } => (
                *op,
                vec![(OperandSlot::Arg1, &mut **left), (OperandSlot::Arg2, &mut **right)],
            ),
        };

        let index = steps.len();
        let mut operands = Vec::with_capacity(children.len());
        for (slot, child) in children {
            let source = child.operand_source();
            if source.is_none() {
                stack.push((child, Some((index, slot))));
            }
            operands.push((slot, source));
        }
        steps.push(Step { op, state, parent, operands });
    }
    steps
}
