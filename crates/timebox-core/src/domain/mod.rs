//! Domain model (ids, status, errors).
//!
//! - **ids**: TaskId（ULID ベース）
//! - **status**: TaskStatus（Pending / Executing / Finished / Cancelled）
//! - **errors**: QueueError

pub mod errors;
pub mod ids;
pub mod status;

pub use self::errors::QueueError;
pub use self::ids::TaskId;
pub use self::status::TaskStatus;
