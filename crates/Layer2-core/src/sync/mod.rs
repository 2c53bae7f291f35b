//! # Origin Size Synchronization
//!
//! 엔티티의 canonical px 기하와 단위별(mm, inch) 표시 값을 일치시킵니다.
//!
//! - `origin_size.rs` - OriginSizeSynchronizer, UnitSnapshot
//! - `throttle.rs` - 엔티티별 연속 동기화 throttle

mod origin_size;
mod throttle;

pub use origin_size::{OriginSizeMap, OriginSizeSynchronizer, PendingResync, SyncStats, UnitSnapshot};
pub use throttle::Throttle;
