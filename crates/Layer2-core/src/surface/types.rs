//! Surface 타입 정의 - 엔티티, 기하 정보, 변경 신호

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// 필드 이름
// ============================================================================

/// 엔티티 기하 필드 이름
pub mod fields {
    pub const LEFT: &str = "left";
    pub const TOP: &str = "top";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const FONT_SIZE: &str = "fontSize";
    pub const STROKE_WIDTH: &str = "strokeWidth";
    pub const RX: &str = "rx";
    pub const RY: &str = "ry";
    pub const BOX_WIDTH: &str = "boxWidth";
    pub const POINTS: &str = "points";
    pub const ANGLE: &str = "angle";
    pub const FILL: &str = "fill";
    pub const TEXT: &str = "text";
    pub const VISIBLE: &str = "visible";
}

/// 엔티티 종류
pub mod kinds {
    pub const WORKSPACE: &str = "workspace";
    pub const RECT: &str = "rect";
    pub const ELLIPSE: &str = "ellipse";
    pub const TEXT: &str = "textbox";
    pub const LINE: &str = "line";
    pub const POLYGON: &str = "polygon";
    pub const GUIDELINE: &str = "guideline";
}

// ============================================================================
// EntityId
// ============================================================================

/// 엔티티 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// 새 고유 ID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 이름으로 지정한 ID
    pub fn named(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 작업 영역 엔티티 ID
    pub fn workspace() -> Self {
        Self::named(kinds::WORKSPACE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::named(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// 점
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 엔티티 속성
///
/// 길이 필드(px)와 비기하 필드(fill, text 등)를 한 맵에 담고,
/// `points`만 별도로 보관합니다. 부분 업데이트(patch)에도 같은 타입을 씁니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 숫자 필드 설정 (builder, 유한하지 않은 값은 무시)
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        if let Ok(value) = finite_number(&name, value) {
            self.fields.insert(name, value);
        }
        self
    }

    /// 임의 값 필드 설정 (builder)
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// 숫자 필드 설정 - NaN, 무한대는 `InvalidMeasurement`
    pub fn set_number(&mut self, name: impl Into<String>, value: f64) -> crate::Result<()> {
        let name = name.into();
        let value = finite_number(&name, value)?;
        self.fields.insert(name, value);
        Ok(())
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// patch 병합 (patch에 있는 필드만 덮어씀)
    pub fn merge(&mut self, patch: &Geometry) {
        for (name, value) in &patch.fields {
            self.fields.insert(name.clone(), value.clone());
        }
        if let Some(points) = &patch.points {
            self.points = Some(points.clone());
        }
    }

    /// JSON 객체에서 생성 (`points`는 점 목록으로 해석)
    pub fn from_map(map: &Map<String, Value>) -> crate::Result<Self> {
        let mut geometry = Geometry::new();
        for (name, value) in map {
            if name == fields::POINTS {
                let points: Vec<Point> = serde_json::from_value(value.clone())?;
                geometry.points = Some(points);
            } else {
                geometry.fields.insert(name.clone(), value.clone());
            }
        }
        Ok(geometry)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.points.is_none()
    }
}

/// f64 → JSON 숫자 (NaN, 무한대 거부)
pub fn finite_number(name: &str, value: f64) -> crate::Result<Value> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| crate::Error::invalid_measurement(name, value.to_string()))
}

/// Surface가 보관하는 엔티티
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: String,
    pub geometry: Geometry,
}

// ============================================================================
// 변경 신호
// ============================================================================

/// 변경 신호 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// 확정된 변경 (드래그 종료, 명시적 대입)
    Settle,
    /// 진행 중인 제스처 (이동/크기/회전 중)
    Continuous,
    /// 엔티티 삭제
    Removed,
}

/// Surface 변경 신호
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSignal {
    pub entity: EntityId,
    pub kind: SignalKind,
    /// 신호 시점의 canonical 기하 (삭제 시 None)
    pub geometry: Option<Geometry>,
}

/// 신호 리스너 (신호 발생 스레드에서 동기 호출)
pub type SurfaceListener = Arc<dyn Fn(&SurfaceSignal) + Send + Sync>;

/// 리스너 구독 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
