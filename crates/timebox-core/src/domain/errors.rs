use thiserror::Error;

use super::TaskId;

/// Errors surfaced by queue construction and submission.
///
/// Task outcomes (finish / timeout / late signal) are never errors; they are
/// status transitions plus callback invocations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is shut down and no longer accepts tasks")]
    Closed,

    /// The task already belongs to a queue, or has left Pending.
    #[error("task {0} was already queued or started")]
    NotPending(TaskId),

    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("invalid queue configuration: {0}")]
    InvalidConfig(String),
}
