//! QueueBuilder - キューの構築
//!
//! # Fail-fast 設計
//! - build() 時に QueueConfig::validate() を実行
//! - runtime が見つからなければ QueueError::NoRuntime

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::{DefaultTimeout, PlainTasks, QueueConfig, TimeoutQueue, WorkQueue};
use crate::domain::QueueError;
use crate::impls::TokioTimer;
use crate::ports::Timer;

/// Builder for `TimeoutQueue` and plain `WorkQueue`s.
///
/// ```ignore
/// let queue = QueueBuilder::new()
///     .max_concurrency(1)
///     .default_timeout(Duration::from_secs(2))
///     .build()?;
/// ```
#[derive(Default)]
pub struct QueueBuilder {
    config: QueueConfig,
    timer: Option<Arc<dyn Timer>>,
    runtime: Option<Handle>,
}

impl QueueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: QueueConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.config.max_concurrency = Some(max);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.config.max_concurrency = None;
        self
    }

    /// Only used by `build()`; plain queues never time out.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = Some(timeout);
        self
    }

    /// Timing facility for every task the queue creates
    /// (default: `TokioTimer` on the queue's runtime).
    pub fn timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Runtime to run the dispatcher on (default: the current one).
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build a `TimeoutQueue` applying `default_timeout` to submissions.
    pub fn build(self) -> Result<TimeoutQueue, QueueError> {
        let (config, timer, runtime) = self.resolve()?;
        let factory = DefaultTimeout::new(config.default_timeout, timer);
        Ok(WorkQueue::spawn(factory, config.max_concurrency, runtime))
    }

    /// Build a queue whose tasks carry no timeout unless set per task.
    pub fn build_plain(self) -> Result<WorkQueue<PlainTasks>, QueueError> {
        let (config, timer, runtime) = self.resolve()?;
        Ok(WorkQueue::spawn(
            PlainTasks::new(timer),
            config.max_concurrency,
            runtime,
        ))
    }

    fn resolve(self) -> Result<(QueueConfig, Arc<dyn Timer>, Handle), QueueError> {
        self.config.validate()?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| QueueError::NoRuntime(e.to_string()))?,
        };
        let timer = self
            .timer
            .unwrap_or_else(|| Arc::new(TokioTimer::new(runtime.clone())));
        Ok((self.config, timer, runtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_outside_runtime_fails() {
        let err = QueueBuilder::new().build().err();
        assert!(matches!(err, Some(QueueError::NoRuntime(_))));
    }

    #[tokio::test]
    async fn build_rejects_zero_concurrency() {
        let err = QueueBuilder::new().max_concurrency(0).build_plain().err();
        assert!(matches!(err, Some(QueueError::InvalidConfig(_))));
    }

    #[test]
    fn build_with_explicit_runtime() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let queue = QueueBuilder::new()
            .max_concurrency(3)
            .unbounded()
            .runtime(rt.handle().clone())
            .build()
            .unwrap();
        assert_eq!(queue.max_concurrency(), None);
        assert_eq!(queue.default_timeout(), None);
    }

    #[tokio::test]
    async fn from_config_carries_settings() {
        let config = QueueConfig {
            max_concurrency: Some(4),
            default_timeout: Some(Duration::from_secs(2)),
        };
        let queue = QueueBuilder::from_config(config).build().unwrap();
        assert_eq!(queue.max_concurrency(), Some(4));
        assert_eq!(queue.default_timeout(), Some(Duration::from_secs(2)));
    }
}
