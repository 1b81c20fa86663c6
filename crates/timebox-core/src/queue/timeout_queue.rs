//! TimeoutQueue - default timeout を自動で付与するキュー
//!
//! WorkQueue に DefaultTimeout factory を組み合わせただけのものです。

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{QueueBuilder, QueueConfig, WorkQueue};
use crate::domain::QueueError;
use crate::ports::{TaskFactory, Timer};
use crate::task::{Completion, TimedTask, Work};

/// Factory that gives every task the queue's current default timeout.
pub struct DefaultTimeout {
    default_timeout: Mutex<Option<Duration>>,
    timer: Arc<dyn Timer>,
}

impl DefaultTimeout {
    pub fn new(default_timeout: Option<Duration>, timer: Arc<dyn Timer>) -> Self {
        Self {
            default_timeout: Mutex::new(default_timeout),
            timer,
        }
    }

    fn create_with(&self, work: Work, timeout: Option<Duration>) -> TimedTask {
        let task = TimedTask::with_options(work, timeout, None);
        task.set_timer(Arc::clone(&self.timer));
        task
    }
}

impl TaskFactory for DefaultTimeout {
    type Task = TimedTask;

    fn create(&self, work: Work) -> TimedTask {
        let timeout = *self.default_timeout.lock();
        self.create_with(work, timeout)
    }
}

/// Work queue that applies `default_timeout` to each task submitted without
/// an explicit one.
pub type TimeoutQueue = WorkQueue<DefaultTimeout>;

impl WorkQueue<DefaultTimeout> {
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        QueueBuilder::from_config(config).build()
    }

    pub fn builder() -> QueueBuilder {
        QueueBuilder::new()
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        *self.factory().default_timeout.lock()
    }

    /// Affects tasks submitted from now on; queued tasks keep their timeout.
    pub fn set_default_timeout(&self, timeout: Option<Duration>) {
        *self.factory().default_timeout.lock() = timeout;
    }

    /// Submit with an explicit timeout that replaces the default outright.
    /// `None` means untimed, even if the queue has a default.
    pub fn submit_with_timeout<W>(
        &self,
        work: W,
        timeout: Option<Duration>,
    ) -> Result<TimedTask, QueueError>
    where
        W: FnOnce(Completion) + Send + 'static,
    {
        let task = self.factory().create_with(Box::new(work), timeout);
        self.enqueue(task.clone())?;
        Ok(task)
    }
}
