//! easel-core: Plugin Host Runtime for Easel
//!
//! Layer2 - 플러그인 호스트와 단위 동기화 레이어
//!
//! # 주요 모듈
//!
//! - `surface`: canonical 캔버스 계약 (`DrawingSurface`) 및 메모리 구현
//! - `hook`: lifecycle lane 파이프라인 (순차 실행, 첫 실패에서 중단)
//! - `plugin`: 플러그인 호스트, 이름 공간 원장, 기본 플러그인
//! - `sync`: origin-size 동기화 (settle / continuous)
//!
//! # 사용 예시
//!
//! ```ignore
//! use easel_core::{builtin, MemorySurface, PluginHost};
//!
//! let surface = Arc::new(MemorySurface::with_workspace(800.0, 600.0));
//! let host = PluginHost::new(surface)?;
//! builtin::install_all(&host).await?;
//!
//! // 현재 단위로 도형 생성
//! host.set_unit(Unit::Millimeter).await?;
//! let id = host.invoke("createRect", vec![json!({ "width": 50, "height": 30 })]).await?;
//!
//! // 저장 전 lane
//! host.run("hookSaveBefore", json!({})).await?;
//!
//! // 우클릭 메뉴
//! let menu = host.collect_menu();
//! ```

pub mod hook;
pub mod plugin;
pub mod surface;
pub mod sync;

pub use easel_foundation::{Error, Result};

// Re-exports: Surface
pub use surface::{
    fields, kinds, DrawingSurface, EntityId, EntityRecord, Geometry, MemorySurface, Point,
    SignalKind, SubscriptionId, SurfaceListener, SurfaceSignal,
};

// Re-exports: Hook
pub use hook::{hook_fn, HookFuture, HookHandler, HookPipeline, LaneRun};

// Re-exports: Plugin
pub use plugin::{
    builtin, CapabilityRegistry, HostBuilder, HostHandle, KeyEvent, KeyPhase, MenuEntry, MenuItem,
    Plugin, PluginContext, PluginDescriptor, PluginHost, PluginInfo, RESERVED_METHODS,
};

// Re-exports: Sync
pub use sync::{OriginSizeMap, OriginSizeSynchronizer, PendingResync, SyncStats, UnitSnapshot};
