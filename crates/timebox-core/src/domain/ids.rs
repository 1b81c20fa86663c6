//! Task identifiers.
//!
//! ULID を使うので、生成順序でソートできる（ログの突き合わせに便利）。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of a timed task (one submission to a queue).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId {
    ulid: Ulid,
}

impl TaskId {
    /// 新しい TaskId を生成
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self { ulid }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl From<Ulid> for TaskId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.ulid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_task_prefix() {
        let ulid = Ulid::new();
        let id = TaskId::from_ulid(ulid);
        assert_eq!(id.to_string(), format!("task-{ulid}"));
        assert_eq!(id.as_ulid(), ulid);
    }

    #[test]
    fn ids_are_sortable_by_generation_time() {
        let id1 = TaskId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2)); // 時刻が進むのを待つ
        let id2 = TaskId::generate();
        assert!(id1 < id2);
    }

    #[test]
    fn ids_can_be_serialized() {
        let id = TaskId::generate();
        let serialized = serde_json::to_string(&id).unwrap();
        let deserialized: TaskId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(id, deserialized);
    }
}
