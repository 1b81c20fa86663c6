use serde::{Deserialize, Serialize};

/// Snapshot of a queue's task counts.
///
/// `finished` and `cancelled` are running totals of terminal outcomes the
/// queue has observed; `cancelled` includes both timeouts and tasks dropped
/// by shutdown before they started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub executing: usize,
    pub finished: usize,
    pub cancelled: usize,
}
