//! Config - 호스트 설정 관리
//!
//! - `host.rs` - HostConfig (lane 목록, DPI, 단위, 동기화 간격, 필드 정책)

mod host;

pub use host::{
    FieldPolicy, HostConfig, DEFAULT_LANES, HOST_CONFIG_FILE, LANE_IMPORT_AFTER,
    LANE_IMPORT_BEFORE, LANE_SAVE_AFTER, LANE_SAVE_BEFORE, LANE_TRANSFORM,
};
