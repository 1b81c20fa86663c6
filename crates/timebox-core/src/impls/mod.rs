//! Impls - port の実装
//!
//! - **TokioTimer**: tokio runtime 上の sleep タスク（本番用）
//! - **ManualTimer**: 手動で時間を進めるタイマー（テスト用）

pub mod manual_timer;
pub mod tokio_timer;

pub use self::manual_timer::ManualTimer;
pub use self::tokio_timer::TokioTimer;
