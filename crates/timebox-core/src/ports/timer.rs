//! Timer port - タイマーの抽象化
//!
//! Task は自分のタイマーを所有し、終端状態に入るときに必ず解放します。
//! テストでは ManualTimer を差し込んで時間を手動で進めます。

use std::fmt;
use std::time::Duration;

/// Callback run when an armed timer expires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Timing facility used by timed tasks.
///
/// `arm` must never invoke `on_fire` synchronously: callers hold the task
/// lock while arming.
pub trait Timer: Send + Sync {
    /// Schedule `on_fire` to run once after `after` has elapsed.
    ///
    /// Dropping (or cancelling) the returned guard disarms the timer.
    fn arm(&self, after: Duration, on_fire: TimerCallback) -> TimerGuard;
}

/// Ownership handle for one armed timer.
///
/// The timer stays armed for exactly as long as the guard is alive.
pub struct TimerGuard {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerGuard {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Disarm now. Same as dropping the guard, but reads better at call sites.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerGuard")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn guard_runs_cancel_exactly_once() {
        let cancelled = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&cancelled);
        let guard = TimerGuard::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        guard.cancel();
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);

        let c = Arc::clone(&cancelled);
        drop(TimerGuard::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(cancelled.load(Ordering::SeqCst), 2);
    }
}
