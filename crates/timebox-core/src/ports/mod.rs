//! Ports - 抽象化レイヤー
//!
//! Queue と Task、Task と Timer の境界を trait として定義します。
//! 実装は `impls` にあります（TokioTimer / ManualTimer）。

pub mod factory;
pub mod task;
pub mod timer;

pub use self::factory::TaskFactory;
pub use self::task::CancellableTask;
pub use self::timer::{Timer, TimerCallback, TimerGuard};
