//! timebox-core
//!
//! Async work queue whose tasks carry per-task timeouts.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（TaskId, TaskStatus, QueueError）
//! - **ports**: 抽象化レイヤー（Timer, CancellableTask, TaskFactory）
//! - **impls**: port の実装（TokioTimer, ManualTimer）
//! - **task**: TimedTask と Completion（状態遷移の本体）
//! - **queue**: WorkQueue / TimeoutQueue / QueueBuilder / QueueConfig
//! - **observability**: QueueCounts
//!
//! ```ignore
//! let queue = TimeoutQueue::builder()
//!     .max_concurrency(1)
//!     .default_timeout(Duration::from_secs(2))
//!     .build()?;
//!
//! queue
//!     .submit(|completion| {
//!         tokio::spawn(async move {
//!             do_io().await;
//!             completion.complete();
//!         });
//!     })?
//!     .on_timeout(|| tracing::warn!("io took too long"));
//! ```

pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod task;

pub use domain::{QueueError, TaskId, TaskStatus};
pub use observability::QueueCounts;
pub use queue::{QueueBuilder, QueueConfig, TimeoutQueue, WorkQueue};
pub use task::{Completion, TimedTask};
