//! Event System - 이벤트 발행/구독 시스템
//!
//! 호스트(단위 변경, 플러그인 설치/제거)와 플러그인(선언한 이벤트)이 발행하는
//! 이벤트를 리스너와 broadcast 수신자에게 전달합니다.
//!
//! ## 사용법
//!
//! ```ignore
//! use easel_foundation::event::{EventBus, EditorEvent, EventListener};
//!
//! struct RulerListener;
//!
//! #[async_trait]
//! impl EventListener for RulerListener {
//!     fn name(&self) -> &str { "ruler" }
//!
//!     async fn on_event(&self, event: &EditorEvent) {
//!         println!("Received: {}", event.name);
//!     }
//! }
//!
//! let bus = EventBus::new();
//! bus.subscribe(Arc::new(RulerListener)).await;
//! bus.publish(types::host::unit_change(Unit::Pixel, Unit::Millimeter)).await;
//! ```

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventFilter, EventListener, EventOrigin, ListenerId, HISTORY_LIMIT};

pub use types::{EditorEvent, EventCategory, EventId};
