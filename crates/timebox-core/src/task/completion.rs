use std::fmt;
use std::sync::Weak;

use super::timed::Inner;
use crate::domain::{TaskId, TaskStatus};

/// Completion signal handed to a task's work.
///
/// Holds only a weak reference: an outstanding `Completion` never keeps a
/// dropped task alive. Calling `complete` more than once, after the task timed
/// out, or after it was dropped is a silent no-op.
#[derive(Clone)]
pub struct Completion {
    task_id: TaskId,
    task: Weak<Inner>,
}

impl Completion {
    pub(super) fn new(task_id: TaskId, task: Weak<Inner>) -> Self {
        Self { task_id, task }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Signal that the work is done.
    pub fn complete(&self) {
        match self.task.upgrade() {
            Some(inner) => inner.finish(),
            None => tracing::trace!(task_id = %self.task_id, "completion for dropped task ignored"),
        }
    }

    /// Whether the work should stop: the task timed out, or nobody holds it
    /// any more.
    pub fn is_cancelled(&self) -> bool {
        self.task
            .upgrade()
            .is_none_or(|inner| inner.status() == TaskStatus::Cancelled)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("task_id", &self.task_id)
            .finish()
    }
}
