//! TokioTimer - tokio の sleep を使ったタイマー
//!
//! arm ごとに sleep タスクを 1 本 spawn し、guard の drop で abort します。

use std::time::Duration;

use tokio::runtime::Handle;

use crate::domain::QueueError;
use crate::ports::{Timer, TimerCallback, TimerGuard};

/// Timer backed by `tokio::time::sleep` on a runtime handle.
///
/// Expiry callbacks run on a runtime worker, not on the thread that armed
/// the timer.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    handle: Handle,
}

impl TokioTimer {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is currently running on.
    pub fn try_current() -> Result<Self, QueueError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| QueueError::NoRuntime(e.to_string()))
    }
}

impl Timer for TokioTimer {
    fn arm(&self, after: Duration, on_fire: TimerCallback) -> TimerGuard {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(after).await;
            on_fire();
        });
        TimerGuard::new(move || join.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn fires_after_duration() {
        let timer = TokioTimer::try_current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let start = Instant::now();

        let _guard = timer.arm(
            Duration::from_secs(2),
            Box::new(move || {
                let _ = tx.send(Instant::now());
            }),
        );

        let fired_at = rx.await.unwrap();
        assert!(fired_at - start >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_guard_disarms() {
        let timer = TokioTimer::try_current().unwrap();
        let fired = Arc::new(AtomicBool::new(false));

        let f = Arc::clone(&fired);
        let guard = timer.arm(
            Duration::from_secs(1),
            Box::new(move || f.store(true, Ordering::SeqCst)),
        );
        drop(guard);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn try_current_outside_runtime_fails() {
        let err = TokioTimer::try_current().unwrap_err();
        assert!(matches!(err, QueueError::NoRuntime(_)));
    }
}
