//! CancellableTask port - Queue が Task に要求する能力
//!
//! Queue の dispatcher はこの trait だけを見てスケジューリングします。
//! status の変化は watch channel で観測します（ポーリング不要）。

use tokio::sync::watch;

use crate::domain::{TaskId, TaskStatus};

/// Capability a unit of work must provide to be scheduled by a `WorkQueue`.
pub trait CancellableTask: Send + Sync + 'static {
    fn id(&self) -> TaskId;

    /// Reserve the task for a single queue.
    ///
    /// Returns `false` if it was already claimed or is no longer pending; the
    /// queue refuses such tasks so each one is counted exactly once.
    fn claim(&self) -> bool;

    /// Begin execution. Must be a no-op unless the task is still pending.
    fn start(&self);

    /// Current status, synchronized with concurrent transitions.
    fn status(&self) -> TaskStatus;

    /// Status channel. A terminal value is published only after the task's
    /// terminal callbacks have returned, so the queue frees the slot last.
    fn subscribe(&self) -> watch::Receiver<TaskStatus>;

    /// Queue-level cancellation of a task that never started.
    ///
    /// Returns `true` if the task moved Pending -> Cancelled. Started tasks
    /// are unaffected.
    fn cancel_pending(&self) -> bool;
}
