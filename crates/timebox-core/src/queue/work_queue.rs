//! WorkQueue - FIFO + 同時実行数制限つきの汎用キュー
//!
//! # 設計
//! - submit された Task は mpsc channel に積まれ、dispatcher が 1 本で取り出す
//! - 同時実行数は Semaphore の permit で制限（None なら無制限）
//! - permit は Task の status channel が終端を報告するまで保持する
//! - Task の生成方法は `TaskFactory` に委譲（継承ではなく合成）

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::domain::{QueueError, TaskStatus};
use crate::observability::QueueCounts;
use crate::ports::{CancellableTask, TaskFactory, Timer};
use crate::task::{Completion, TimedTask, Work};

/// Factory for untimed tasks: the plain queue behaviour.
pub struct PlainTasks {
    timer: Arc<dyn Timer>,
}

impl PlainTasks {
    pub fn new(timer: Arc<dyn Timer>) -> Self {
        Self { timer }
    }
}

impl TaskFactory for PlainTasks {
    type Task = TimedTask;

    fn create(&self, work: Work) -> TimedTask {
        let task = TimedTask::with_options(work, None, None);
        task.set_timer(Arc::clone(&self.timer));
        task
    }
}

/// State shared between the queue handle, the dispatcher and slot watchers.
struct Shared {
    closed: AtomicBool,
    pending: AtomicUsize,
    executing: AtomicUsize,
    finished: AtomicUsize,
    cancelled: AtomicUsize,
    /// Submitted but not yet observed terminal.
    outstanding: watch::Sender<usize>,
}

impl Shared {
    fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            closed: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
            executing: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
            outstanding,
        }
    }

    fn record_terminal(&self, status: TaskStatus) {
        match status {
            TaskStatus::Finished => {
                self.finished.fetch_add(1, Ordering::SeqCst);
            }
            TaskStatus::Cancelled => {
                self.cancelled.fetch_add(1, Ordering::SeqCst);
            }
            TaskStatus::Pending | TaskStatus::Executing => {}
        }
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Concurrent work queue parameterized by a task-construction strategy.
///
/// Tasks start in submission order. At most `max_concurrency` tasks are
/// executing at once; a slot frees up when the running task reports a
/// terminal status (and its terminal hooks have returned).
///
/// Dropping the queue closes submission; tasks already queued still run.
pub struct WorkQueue<F: TaskFactory> {
    factory: F,
    tx: Mutex<Option<mpsc::UnboundedSender<F::Task>>>,
    shared: Arc<Shared>,
    runtime: Handle,
    max_concurrency: Option<usize>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl<F: TaskFactory> WorkQueue<F> {
    /// Spawn the dispatcher on `runtime`. Use `QueueBuilder` for validated
    /// construction.
    pub(crate) fn spawn(factory: F, max_concurrency: Option<usize>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::new());
        let limiter = max_concurrency.map(|n| Arc::new(Semaphore::new(n)));
        let dispatcher = runtime.spawn(dispatch_loop(rx, limiter, Arc::clone(&shared)));

        Self {
            factory,
            tx: Mutex::new(Some(tx)),
            shared,
            runtime,
            max_concurrency,
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn max_concurrency(&self) -> Option<usize> {
        self.max_concurrency
    }

    /// Wrap `work` with the factory and enqueue it.
    ///
    /// The returned handle may already be executing by the time the caller
    /// configures it; see `enqueue` for the race-free alternative.
    ///
    /// Work that panics before completing is only recovered by its timeout;
    /// on an untimed queue the task keeps its slot.
    pub fn submit<W>(&self, work: W) -> Result<F::Task, QueueError>
    where
        W: FnOnce(Completion) + Send + 'static,
    {
        let task = self.factory.create(Box::new(work));
        self.enqueue(task.clone())?;
        Ok(task)
    }

    /// Submit an async job. `make` receives the completion handle (for
    /// `is_cancelled` checks); the task completes when the future resolves.
    ///
    /// A timeout does not abort the future; it only stops the queue waiting
    /// for it.
    pub fn submit_async<M, Fut>(&self, make: M) -> Result<F::Task, QueueError>
    where
        M: FnOnce(Completion) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = self.runtime.clone();
        self.submit(move |completion: Completion| {
            let fut = make(completion.clone());
            runtime.spawn(async move {
                fut.await;
                completion.complete();
            });
        })
    }

    /// Enqueue a task that was built (and configured) ahead of time.
    ///
    /// Only a pending task that no queue has accepted yet is taken; anything
    /// else is refused with `QueueError::NotPending`.
    pub fn enqueue(&self, task: F::Task) -> Result<(), QueueError> {
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            return Err(QueueError::Closed);
        };
        let task_id = task.id();
        if !task.claim() {
            debug!(task_id = %task_id, status = ?task.status(), "enqueue refused");
            return Err(QueueError::NotPending(task_id));
        }
        self.shared.outstanding.send_modify(|n| *n += 1);
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        if tx.send(task).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            self.shared.outstanding.send_modify(|n| *n = n.saturating_sub(1));
            return Err(QueueError::Closed);
        }
        trace!(task_id = %task_id, "task enqueued");
        Ok(())
    }

    pub fn counts(&self) -> QueueCounts {
        QueueCounts {
            pending: self.shared.pending.load(Ordering::SeqCst),
            executing: self.shared.executing.load(Ordering::SeqCst),
            finished: self.shared.finished.load(Ordering::SeqCst),
            cancelled: self.shared.cancelled.load(Ordering::SeqCst),
        }
    }

    /// Resolve once every task submitted so far has been observed terminal.
    pub async fn wait_until_all_finished(&self) {
        let mut rx = self.shared.outstanding.subscribe();
        // Sender lives in `shared`, which `self` keeps alive.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Stop accepting work. Tasks that have not started yet are cancelled
    /// (no hooks run); executing tasks are left alone.
    pub fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        drop(self.tx.lock().take());
        debug!("queue shutdown requested");
    }

    /// Shut down, then wait for the dispatcher and every in-flight task.
    ///
    /// An executing task with no timeout that never completes keeps this
    /// pending forever.
    pub async fn shutdown_and_join(&self) {
        self.shutdown();
        let dispatcher = self.dispatcher.lock().take();
        if let Some(dispatcher) = dispatcher {
            let _ = dispatcher.await;
        }
        self.wait_until_all_finished().await;
    }
}

async fn dispatch_loop<T: CancellableTask + Clone>(
    mut rx: mpsc::UnboundedReceiver<T>,
    limiter: Option<Arc<Semaphore>>,
    shared: Arc<Shared>,
) {
    while let Some(task) = rx.recv().await {
        let permit = match &limiter {
            // semaphore は close しないので Err にはならない
            Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
            None => None,
        };
        shared.pending.fetch_sub(1, Ordering::SeqCst);

        let closed = shared.closed.load(Ordering::SeqCst);
        if closed {
            if task.cancel_pending() {
                debug!(task_id = %task.id(), "pending task cancelled by shutdown");
            }
            let status = task.status();
            if status.is_terminal() {
                shared.record_terminal(status);
                continue;
            }
            // 手動で start された task は終端まで見届ける
            debug!(task_id = %task.id(), ?status, "shutdown waits for started task");
        }

        let mut status_rx = task.subscribe();
        shared.executing.fetch_add(1, Ordering::SeqCst);

        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            // work が同期的に重くても dispatcher は次の task を取り出せる
            if !closed {
                task.start();
            }
            let status = status_rx
                .wait_for(|status| status.is_terminal())
                .await
                .map(|status| *status)
                .unwrap_or_else(|_| task.status());
            drop(permit);
            shared.executing.fetch_sub(1, Ordering::SeqCst);
            shared.record_terminal(status);
            trace!(task_id = %task.id(), ?status, "slot released");
        });
    }
    debug!("dispatcher stopped");
}
