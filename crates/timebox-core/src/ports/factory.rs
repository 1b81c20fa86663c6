//! TaskFactory port - submit された work をどんな Task に包むかの戦略

use crate::ports::CancellableTask;
use crate::task::Work;

/// Task-construction strategy a `WorkQueue` is parameterized by.
///
/// `WorkQueue` owns FIFO admission and the concurrency limit; the factory
/// decides what the scheduled unit looks like (e.g. which timeout it gets).
pub trait TaskFactory: Send + Sync + 'static {
    type Task: CancellableTask + Clone;

    fn create(&self, work: Work) -> Self::Task;
}
