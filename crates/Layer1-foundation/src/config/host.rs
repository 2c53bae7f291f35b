//! Host Config - 플러그인 호스트 설정
//!
//! 호스트 생성 시 주입되는 설정: 인식할 lifecycle lane 목록, 기본 DPI/단위/자리수,
//! 연속 동기화 간격, 필드 변환 정책.

use crate::storage::JsonStore;
use crate::units::{Unit, DEFAULT_DPI};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// 설정 파일명
pub const HOST_CONFIG_FILE: &str = "config.json";

pub const LANE_IMPORT_BEFORE: &str = "hookImportBefore";
pub const LANE_IMPORT_AFTER: &str = "hookImportAfter";
pub const LANE_SAVE_BEFORE: &str = "hookSaveBefore";
pub const LANE_SAVE_AFTER: &str = "hookSaveAfter";
pub const LANE_TRANSFORM: &str = "hookTransform";

/// 기본 lifecycle lane 목록 (실행 순서와 무관, 인식 목록일 뿐)
pub const DEFAULT_LANES: [&str; 5] = [
    LANE_IMPORT_BEFORE,
    LANE_IMPORT_AFTER,
    LANE_SAVE_BEFORE,
    LANE_SAVE_AFTER,
    LANE_TRANSFORM,
];

// ============================================================================
// Field Policy
// ============================================================================

/// 단위 변환 대상 필드 정책
///
/// `length_fields`에 있는 필드만 변환하고 나머지는 그대로 통과시킵니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPolicy {
    /// 길이 단위로 변환할 스칼라 필드
    #[serde(default = "default_length_fields")]
    pub length_fields: Vec<String>,

    /// `points` 목록 변환 여부
    #[serde(default = "default_true")]
    pub convert_points: bool,
}

impl FieldPolicy {
    pub fn new(length_fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            length_fields: length_fields.into_iter().map(Into::into).collect(),
            convert_points: true,
        }
    }

    pub fn with_points(mut self, convert_points: bool) -> Self {
        self.convert_points = convert_points;
        self
    }

    pub fn is_length_field(&self, name: &str) -> bool {
        self.length_fields.iter().any(|field| field == name)
    }
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self {
            length_fields: default_length_fields(),
            convert_points: true,
        }
    }
}

fn default_length_fields() -> Vec<String> {
    [
        "left",
        "top",
        "width",
        "height",
        "fontSize",
        "strokeWidth",
        "rx",
        "ry",
        "boxWidth",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Host Config
// ============================================================================

/// 플러그인 호스트 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    /// 인식할 lifecycle lane 이름
    #[serde(default = "default_lanes")]
    pub lanes: Vec<String>,

    /// 기본 DPI (디바이스 DPI 측정 실패 시)
    #[serde(default = "default_dpi")]
    pub default_dpi: f64,

    /// 초기 표시 단위
    #[serde(default)]
    pub default_unit: Unit,

    /// 초기 표시 자리수 (None이면 기본값)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    /// 연속 동기화 최소 간격 (ms)
    #[serde(default = "default_sync_interval")]
    pub continuous_sync_interval_ms: u64,

    /// 필드 변환 정책
    #[serde(default)]
    pub field_policy: FieldPolicy,
}

fn default_lanes() -> Vec<String> {
    DEFAULT_LANES.iter().map(|lane| lane.to_string()).collect()
}

fn default_dpi() -> f64 {
    DEFAULT_DPI
}

fn default_sync_interval() -> u64 {
    30
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            lanes: default_lanes(),
            default_dpi: default_dpi(),
            default_unit: Unit::default(),
            precision: None,
            continuous_sync_interval_ms: default_sync_interval(),
            field_policy: FieldPolicy::default(),
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn with_lanes(mut self, lanes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.lanes = lanes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_dpi(mut self, dpi: f64) -> Self {
        self.default_dpi = dpi;
        self
    }

    pub fn with_default_unit(mut self, unit: Unit) -> Self {
        self.default_unit = unit;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_sync_interval_ms(mut self, interval_ms: u64) -> Self {
        self.continuous_sync_interval_ms = interval_ms;
        self
    }

    pub fn with_field_policy(mut self, policy: FieldPolicy) -> Self {
        self.field_policy = policy;
        self
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// 설정 검증
    pub fn validate(&self) -> Result<()> {
        if self.lanes.is_empty() {
            return Err(Error::Config("At least one lifecycle lane is required".into()));
        }

        let mut seen = HashSet::new();
        for lane in &self.lanes {
            if lane.trim().is_empty() {
                return Err(Error::Config("Lane name cannot be empty".into()));
            }
            if !seen.insert(lane.as_str()) {
                return Err(Error::Config(format!("Duplicate lane: {}", lane)));
            }
        }

        if !self.default_dpi.is_finite() || self.default_dpi <= 0.0 {
            return Err(Error::Config(format!(
                "defaultDpi must be greater than 0, got {}",
                self.default_dpi
            )));
        }

        if self.continuous_sync_interval_ms == 0 {
            return Err(Error::Config(
                "continuousSyncIntervalMs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 파일에서 로드 (확장자로 JSON/TOML 구분)
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: HostConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded host config from {}", path.display());
        Ok(config)
    }

    /// 글로벌 + 프로젝트 병합 로드 (프로젝트 우선)
    pub fn load() -> Result<Self> {
        let global = JsonStore::global().ok();
        let project = JsonStore::current_project().ok();
        Self::load_layered(global.as_ref(), project.as_ref())
    }

    /// 지정한 저장소들을 순서대로 병합
    pub fn load_layered(global: Option<&JsonStore>, project: Option<&JsonStore>) -> Result<Self> {
        let mut merged = Value::Object(Default::default());

        for store in [global, project].into_iter().flatten() {
            if let Some(layer) = store.load_optional::<Value>(HOST_CONFIG_FILE)? {
                merge_value(&mut merged, layer);
            }
        }

        let config: HostConfig = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// 글로벌 설정 저장
    pub fn save_global(&self) -> Result<()> {
        JsonStore::global()?.save(HOST_CONFIG_FILE, self)
    }

    /// 프로젝트 설정 저장
    pub fn save_project(&self) -> Result<()> {
        JsonStore::current_project()?.save(HOST_CONFIG_FILE, self)
    }
}

/// 객체는 재귀 병합, 나머지는 덮어쓰기
fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
