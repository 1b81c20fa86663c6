//! ManualTimer - テスト用の手動タイマー
//!
//! 仮想時刻を `advance()` で進め、期限を過ぎたコールバックを呼び出します。
//! コールバックは内部ロックを解放してから呼ぶので、コールバック内で
//! 再度 arm / cancel しても deadlock しません。

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::ports::{Timer, TimerCallback, TimerGuard};

struct Armed {
    deadline: Duration,
    on_fire: TimerCallback,
}

#[derive(Default)]
struct ManualState {
    /// Virtual time since the timer was created.
    now: Duration,
    next_key: u64,
    armed: BTreeMap<u64, Armed>,
}

/// Deterministic timer driven by explicit `advance` calls.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of timers currently armed.
    pub fn armed_count(&self) -> usize {
        self.state.lock().armed.len()
    }

    /// Move virtual time forward, firing every timer whose deadline is reached
    /// (earliest first, ties in arming order). Returns how many fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().now + by;
        let mut fired = 0;
        loop {
            let next = {
                let mut state = self.state.lock();
                let due = state
                    .armed
                    .iter()
                    .filter(|(_, armed)| armed.deadline <= target)
                    .min_by_key(|(key, armed)| (armed.deadline, **key))
                    .map(|(key, _)| *key);
                due.and_then(|key| state.armed.remove(&key)).map(|armed| {
                    state.now = armed.deadline;
                    armed.on_fire
                })
            };
            let Some(on_fire) = next else {
                break;
            };
            on_fire();
            fired += 1;
        }
        self.state.lock().now = target;
        fired
    }
}

impl Timer for ManualTimer {
    fn arm(&self, after: Duration, on_fire: TimerCallback) -> TimerGuard {
        let key = {
            let mut state = self.state.lock();
            let key = state.next_key;
            state.next_key += 1;
            let deadline = state.now + after;
            state.armed.insert(key, Armed { deadline, on_fire });
            key
        };
        let state = Arc::downgrade(&self.state);
        TimerGuard::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().armed.remove(&key);
            }
        })
    }
}
