//! Hook 타입 정의

use crate::Result;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Hook 핸들러가 반환하는 지연 결과
///
/// `Some(payload)`를 반환하면 다음 핸들러와 `run` 호출자가 받는 payload를 교체합니다.
pub type HookFuture = BoxFuture<'static, Result<Option<Value>>>;

/// Lane에 등록되는 핸들러
pub type HookHandler = Arc<dyn Fn(Value) -> HookFuture + Send + Sync>;

/// async 클로저를 HookHandler로 변환
pub fn hook_fn<F, Fut>(f: F) -> HookHandler
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>>> + Send + 'static,
{
    Arc::new(move |payload| Box::pin(f(payload)))
}

/// Lane 항목 (소유 플러그인 + 핸들러)
#[derive(Clone)]
pub struct LaneEntry {
    pub owner: String,
    pub(crate) handler: HookHandler,
}

impl std::fmt::Debug for LaneEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaneEntry")
            .field("owner", &self.owner)
            .finish()
    }
}

/// 한 번의 lane 실행 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneRun {
    pub lane: String,
    /// 실행된 핸들러 소유자 (실행 순서)
    pub executed: Vec<String>,
    /// 최종 payload
    pub payload: Value,
    pub duration_ms: u64,
}
