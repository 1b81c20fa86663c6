use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use super::{Callback, Completion, Work};
use crate::domain::{TaskId, TaskStatus};
use crate::impls::TokioTimer;
use crate::ports::{CancellableTask, Timer, TimerGuard};

/// A unit of asynchronous work with an optional timeout.
///
/// `TimedTask` is a handle: clones share the same task. The queue keeps one
/// clone until it has observed the terminal status.
///
/// # Configuration order
/// `on_timeout`, `on_completion_or_timeout` and `set_timeout` are accepted at
/// any time, but nothing is replayed: a hook registered after the task became
/// terminal never runs. When the queue has a free slot, a freshly submitted
/// task may already be executing before chained configuration runs; build the
/// task first and `enqueue` it when the hooks must be in place.
#[derive(Clone)]
pub struct TimedTask {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    id: TaskId,
    core: Mutex<Core>,
    /// Mirrors `Core::status` for the queue. Terminal values are sent after
    /// the terminal hooks have returned.
    status_tx: watch::Sender<TaskStatus>,
}

struct Core {
    status: TaskStatus,
    work: Option<Work>,
    timeout: Option<Duration>,
    timer: Option<Arc<dyn Timer>>,
    armed: Option<TimerGuard>,
    /// Bumped on every re-arm so a superseded timer that already fired is
    /// recognised as stale.
    generation: u64,
    /// Set once a queue accepted the task.
    claimed: bool,
    on_timeout: Option<Callback>,
    on_completion_or_timeout: Option<Callback>,
}

/// Hooks taken out of the task by the winning terminal transition.
struct Terminal {
    status: TaskStatus,
    on_timeout: Option<Callback>,
    on_completion_or_timeout: Option<Callback>,
}

impl TimedTask {
    /// Untimed task with no hooks.
    pub fn new<W>(work: W) -> Self
    where
        W: FnOnce(Completion) + Send + 'static,
    {
        Self::with_options(Box::new(work), None, None)
    }

    pub fn with_options(
        work: Work,
        timeout: Option<Duration>,
        on_timeout: Option<Callback>,
    ) -> Self {
        let (status_tx, _) = watch::channel(TaskStatus::Pending);
        Self {
            inner: Arc::new(Inner {
                id: TaskId::generate(),
                core: Mutex::new(Core {
                    status: TaskStatus::Pending,
                    work: Some(work),
                    timeout,
                    timer: None,
                    armed: None,
                    generation: 0,
                    claimed: false,
                    on_timeout,
                    on_completion_or_timeout: None,
                }),
                status_tx,
            }),
        }
    }

    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    pub fn status(&self) -> TaskStatus {
        self.inner.status()
    }

    pub fn is_executing(&self) -> bool {
        self.status().is_executing()
    }

    pub fn is_finished(&self) -> bool {
        self.status() == TaskStatus::Finished
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == TaskStatus::Cancelled
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.core.lock().timeout
    }

    /// Replace the hook run when the timer cancels the task.
    pub fn on_timeout<F>(&self, callback: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.core.lock().on_timeout = Some(Box::new(callback));
        self
    }

    /// Replace the hook run on either terminal transition (finish or timeout).
    /// On timeout it runs after `on_timeout`.
    pub fn on_completion_or_timeout<F>(&self, callback: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.core.lock().on_completion_or_timeout = Some(Box::new(callback));
        self
    }

    /// Replace the timeout. While executing, the armed timer is cancelled and a
    /// new one is armed for `timeout` from now. `None` disables the timer.
    pub fn set_timeout(&self, timeout: Option<Duration>) -> &Self {
        let mut core = self.inner.core.lock();
        core.timeout = timeout;
        if core.status == TaskStatus::Executing {
            self.inner.rearm(&mut core);
        }
        self
    }

    /// Select the timing facility. Takes effect the next time the timer is armed.
    pub fn set_timer(&self, timer: Arc<dyn Timer>) -> &Self {
        self.inner.core.lock().timer = Some(timer);
        self
    }

    /// Pending -> Executing: arm the timer, then run the work.
    ///
    /// No-op in any other state, so a task cancelled before it started stays
    /// cancelled.
    ///
    /// If `work` panics before handing off its `Completion`, nothing can
    /// finish the task: it stays Executing until the timeout fires. An untimed
    /// task whose work panics stays Executing for good and keeps its queue
    /// slot.
    pub fn start(&self) {
        let work = {
            let mut core = self.inner.core.lock();
            if core.status != TaskStatus::Pending {
                trace!(task_id = %self.inner.id, status = ?core.status, "start ignored");
                return;
            }
            core.status = TaskStatus::Executing;
            self.inner.status_tx.send_replace(TaskStatus::Executing);
            self.inner.rearm(&mut core);
            core.work.take()
        };
        debug!(task_id = %self.inner.id, "task started");

        if let Some(work) = work {
            let completion = Completion::new(self.inner.id, Arc::downgrade(&self.inner));
            if catch_unwind(AssertUnwindSafe(move || work(completion))).is_err() {
                // タイマーがあれば timeout で終端に入る
                warn!(task_id = %self.inner.id, "work panicked before signalling completion");
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Wait until the task is terminal (and its hooks have run).
    pub async fn wait(&self) -> TaskStatus {
        let mut rx = self.subscribe();
        // Sender cannot close while `self` holds the task.
        rx.wait_for(|status| status.is_terminal())
            .await
            .map(|status| *status)
            .unwrap_or_else(|_| self.status())
    }
}

impl Inner {
    pub(crate) fn status(&self) -> TaskStatus {
        self.core.lock().status
    }

    /// Drop any armed timer and, if a timeout is set, arm a new one from now.
    fn rearm(self: &Arc<Self>, core: &mut Core) {
        if let Some(previous) = core.armed.take() {
            previous.cancel();
        }
        core.generation = core.generation.wrapping_add(1);

        let Some(after) = core.timeout else {
            return;
        };
        let timer = match core.timer.clone() {
            Some(timer) => timer,
            None => match TokioTimer::try_current() {
                Ok(timer) => {
                    let timer: Arc<dyn Timer> = Arc::new(timer);
                    core.timer = Some(Arc::clone(&timer));
                    timer
                }
                Err(e) => {
                    warn!(task_id = %self.id, error = %e, "no timer available, running untimed");
                    return;
                }
            },
        };

        let task = Arc::downgrade(self);
        let generation = core.generation;
        core.armed = Some(timer.arm(
            after,
            Box::new(move || {
                if let Some(inner) = task.upgrade() {
                    inner.expire(generation);
                }
            }),
        ));
        debug!(task_id = %self.id, timeout = ?after, "timer armed");
    }

    /// Completion signal: Executing -> Finished.
    pub(crate) fn finish(&self) {
        let (armed, terminal) = {
            let mut core = self.core.lock();
            let armed = core.armed.take();
            if core.status != TaskStatus::Executing {
                (armed, None)
            } else {
                core.status = TaskStatus::Finished;
                (
                    armed,
                    Some(Terminal {
                        status: TaskStatus::Finished,
                        on_timeout: None,
                        on_completion_or_timeout: core.on_completion_or_timeout.take(),
                    }),
                )
            }
        };
        drop(armed);

        match terminal {
            Some(terminal) => {
                debug!(task_id = %self.id, "task finished");
                self.publish(terminal);
            }
            None => trace!(task_id = %self.id, "late completion ignored"),
        }
    }

    /// Timer expiry: Executing -> Cancelled.
    fn expire(&self, generation: u64) {
        let (armed, terminal) = {
            let mut core = self.core.lock();
            if core.generation != generation {
                trace!(task_id = %self.id, "stale timer ignored");
                return;
            }
            let armed = core.armed.take();
            if core.status.is_terminal() {
                (armed, None)
            } else {
                core.status = TaskStatus::Cancelled;
                (
                    armed,
                    Some(Terminal {
                        status: TaskStatus::Cancelled,
                        on_timeout: core.on_timeout.take(),
                        on_completion_or_timeout: core.on_completion_or_timeout.take(),
                    }),
                )
            }
        };
        drop(armed);

        match terminal {
            Some(terminal) => {
                info!(task_id = %self.id, "task timed out");
                self.publish(terminal);
            }
            None => trace!(task_id = %self.id, "late timer fire ignored"),
        }
    }

    /// Run the terminal hooks outside the lock, then release the queue slot.
    fn publish(&self, terminal: Terminal) {
        run_hook(self.id, "on_timeout", terminal.on_timeout);
        run_hook(
            self.id,
            "on_completion_or_timeout",
            terminal.on_completion_or_timeout,
        );
        self.status_tx.send_replace(terminal.status);
    }

    fn claim(&self) -> bool {
        let mut core = self.core.lock();
        if core.claimed || core.status != TaskStatus::Pending {
            return false;
        }
        core.claimed = true;
        true
    }

    fn cancel_pending(&self) -> bool {
        let work = {
            let mut core = self.core.lock();
            if core.status != TaskStatus::Pending {
                return false;
            }
            core.status = TaskStatus::Cancelled;
            self.status_tx.send_replace(TaskStatus::Cancelled);
            core.work.take()
        };
        // work は lock の外で drop する
        drop(work);
        true
    }
}

fn run_hook(task_id: TaskId, hook: &'static str, callback: Option<Callback>) {
    let Some(callback) = callback else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        warn!(task_id = %task_id, hook, "task hook panicked");
    }
}

impl CancellableTask for TimedTask {
    fn id(&self) -> TaskId {
        self.inner.id
    }

    fn claim(&self) -> bool {
        self.inner.claim()
    }

    fn start(&self) {
        TimedTask::start(self)
    }

    fn status(&self) -> TaskStatus {
        self.inner.status()
    }

    fn subscribe(&self) -> watch::Receiver<TaskStatus> {
        TimedTask::subscribe(self)
    }

    fn cancel_pending(&self) -> bool {
        self.inner.cancel_pending()
    }
}

impl fmt::Debug for TimedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("TimedTask")
            .field("id", &self.inner.id)
            .field("status", &core.status)
            .field("timeout", &core.timeout)
            .field("timer_armed", &core.armed.is_some())
            .finish()
    }
}
