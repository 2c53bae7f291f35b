//! # Hook System
//!
//! 이름 붙은 lifecycle lane을 순서대로, 하나씩 비동기 실행합니다.
//!
//! ## 개요
//!
//! - 인식하는 lane 목록은 호스트 생성 시 설정으로 주어집니다.
//! - 핸들러는 설치 순서대로 실행되며 동시에 실행되지 않습니다.
//! - 핸들러 하나가 실패하면 그 lane 실행은 즉시 중단되고,
//!   `Error::HookExecution { lane, owner, cause }`로 감싸져 전파됩니다.
//!
//! ## 예시
//!
//! ```ignore
//! let pipeline = HookPipeline::new(["hookSaveBefore", "hookSaveAfter"]);
//!
//! pipeline.register("hookSaveBefore", "RulerPlugin", hook_fn(|payload| async move {
//!     // 가이드라인 숨기기...
//!     Ok(None)
//! }))?;
//!
//! let payload = pipeline.run("hookSaveBefore", json!({})).await?;
//! ```

mod pipeline;
mod types;

pub use pipeline::HookPipeline;
pub use types::{hook_fn, HookFuture, HookHandler, LaneEntry, LaneRun};
