//! # easel-foundation
//!
//! Foundation layer for Easel:
//! - Error: 공통 에러 타입
//! - Units: px ↔ mm/inch 변환, 자리수 처리, 전역 단위 상태
//! - Config: 호스트 설정 (lane 목록, DPI, 동기화 간격, 필드 정책)
//! - Storage: JsonStore (글로벌 / 프로젝트 설정 파일)
//! - Event: 이벤트 버스
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  easel-core (PluginHost, HookPipeline, Synchronizer)    │
//! │                     │                                   │
//! │         ┌───────────┼───────────┐                       │
//! │         ▼           ▼           ▼                       │
//! │   UnitConverter  HostConfig   EventBus                  │
//! │   UnitState      JsonStore                              │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod storage;
pub mod units;

// ============================================================================
// Error
// ============================================================================
pub use error::{CapabilityKind, Error, Result};

// ============================================================================
// Units (단위 변환)
// ============================================================================
pub use units::{
    format_precision, round_to, DpiDetector, Measure, Rounding, Unit, UnitConverter, UnitSetting,
    UnitState, DEFAULT_DPI, DEFAULT_PRECISION, INCH_TO_MM, POINTS_PER_INCH,
    STANDARD_DPI_HIGH_RES, STANDARD_DPI_PRINT, STANDARD_DPI_SCREEN,
};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    FieldPolicy, HostConfig, DEFAULT_LANES, HOST_CONFIG_FILE, LANE_IMPORT_AFTER,
    LANE_IMPORT_BEFORE, LANE_SAVE_AFTER, LANE_SAVE_BEFORE, LANE_TRANSFORM,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;

// ============================================================================
// Event (이벤트 시스템)
// ============================================================================
pub use event::{
    EditorEvent, EventBus, EventCategory, EventFilter, EventId, EventListener, EventOrigin,
    ListenerId,
};
