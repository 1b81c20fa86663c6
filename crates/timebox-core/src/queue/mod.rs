//! Queue module: generic work queue, timeout queue, configuration.

mod builder;
mod config;
mod timeout_queue;
mod work_queue;

pub use builder::QueueBuilder;
pub use config::QueueConfig;
pub use timeout_queue::{DefaultTimeout, TimeoutQueue};
pub use work_queue::{PlainTasks, WorkQueue};
