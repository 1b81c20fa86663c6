//! Task status machine.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a timed task.
///
/// State transitions:
/// - Pending -> Executing (queue starts the task)
/// - Executing -> Finished (work called its completion)
/// - Executing -> Cancelled (timer fired first)
/// - Pending -> Cancelled (queue shut down before the task ever started)
///
/// Finished and Cancelled are terminal and mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Created, not yet started by the queue.
    Pending,

    /// Work has been invoked and has not signalled completion yet.
    Executing,

    /// Work signalled completion before the deadline.
    Finished,

    /// Deadline passed (or the queue dropped the task before starting it).
    Cancelled,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Cancelled)
    }

    /// Does this task currently occupy a queue slot?
    pub fn is_executing(self) -> bool {
        matches!(self, TaskStatus::Executing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaskStatus::Pending, false, false)]
    #[case(TaskStatus::Executing, false, true)]
    #[case(TaskStatus::Finished, true, false)]
    #[case(TaskStatus::Cancelled, true, false)]
    fn classification(#[case] status: TaskStatus, #[case] terminal: bool, #[case] executing: bool) {
        assert_eq!(status.is_terminal(), terminal);
        assert_eq!(status.is_executing(), executing);
    }
}
