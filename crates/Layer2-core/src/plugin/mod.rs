//! # Plugin System
//!
//! 편집기 플러그인 호스트
//!
//! ## 개요
//!
//! 플러그인은 다음을 호스트에 기여할 수 있습니다:
//! - 이벤트 이름, API 이름 (이름 공간 원장으로 충돌 검사)
//! - lifecycle lane 핸들러 (`hookSaveBefore` 등)
//! - 단축키 콜백
//! - 우클릭 메뉴 항목
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        PluginHost                           │
//! │  ┌──────────────────┐  ┌──────────────┐  ┌──────────────┐  │
//! │  │CapabilityRegistry│  │ HookPipeline │  │ PluginTable  │  │
//! │  │ (이벤트/API 원장) │  │ (lane 실행)  │  │ (설치 순서)  │  │
//! │  └──────────────────┘  └──────────────┘  └──────────────┘  │
//! │            │                                                │
//! │  ┌─────────┴─────────────────────────────────────────────┐ │
//! │  │  API 맵 / 단축키 바인딩 / OriginSizeSynchronizer       │ │
//! │  └───────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                    DrawingSurface (px)
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! struct MyPlugin;
//!
//! #[async_trait]
//! impl Plugin for MyPlugin {
//!     fn name(&self) -> &str { "MyPlugin" }
//!     fn hooks(&self) -> Vec<String> { vec!["hookSaveBefore".into()] }
//! }
//!
//! let descriptor = PluginDescriptor::new("MyPlugin", |_ctx| {
//!     Ok(Arc::new(MyPlugin) as Arc<dyn Plugin>)
//! });
//! host.install(descriptor, json!({})).await?;
//! ```

pub mod builtin;
mod descriptor;
mod host;
mod menu;
mod registry;
mod table;
mod traits;

pub use descriptor::{PluginConstructor, PluginContext, PluginDescriptor, PluginInfo};
pub use host::{ApiMethod, HostBuilder, HostHandle, HotkeyCallback, PluginHost, RESERVED_METHODS};
pub use menu::{MenuAction, MenuEntry, MenuItem};
pub use registry::{CapabilityRegistry, HOST_OWNER};
pub use table::{PluginEntry, PluginTable};
pub use traits::{KeyEvent, KeyPhase, Plugin};
