//! Timed task - タイムアウト付きの非同期 work
//!
//! # 状態遷移
//! ```text
//! Pending --start()--> Executing
//! Executing --complete()--> Finished   (terminal)
//! Executing --timer fires--> Cancelled (terminal)
//! ```
//! complete と timer の競合は task 内の Mutex で 1 回だけ勝者を決めます。

mod completion;
mod timed;

pub use self::completion::Completion;
pub use self::timed::TimedTask;

/// The unit of work a task runs. It receives the completion signal and is
/// expected to call it later, typically from another task or thread.
pub type Work = Box<dyn FnOnce(Completion) + Send + 'static>;

/// Terminal-notification hook (`on_timeout` / `on_completion_or_timeout`).
pub type Callback = Box<dyn FnOnce() + Send + 'static>;
