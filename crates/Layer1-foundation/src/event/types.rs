//! Event Types - 호스트와 플러그인이 발행하는 이벤트 정의

use crate::units::Unit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ============================================================================
// Event ID
// ============================================================================

/// 이벤트 고유 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// 새 이벤트 ID 생성
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event Category
// ============================================================================

/// 이벤트 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// 호스트 수명주기 (설치, 제거)
    Host,
    /// 단위/자리수 변경
    Unit,
    /// 플러그인이 선언한 이벤트
    Plugin,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Unit => "unit",
            Self::Plugin => "plugin",
        }
    }
}

// ============================================================================
// EditorEvent
// ============================================================================

/// 에디터 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorEvent {
    pub id: EventId,

    /// 이벤트 이름 (예: "unitChange", 플러그인 선언 이벤트)
    pub name: String,

    pub category: EventCategory,

    pub timestamp: DateTime<Utc>,

    /// 발행 주체 ("host" 또는 플러그인 이름)
    pub source: String,

    pub data: Value,
}

impl EditorEvent {
    pub fn new(name: impl Into<String>, category: EventCategory) -> Self {
        Self {
            id: EventId::new(),
            name: name.into(),
            category,
            timestamp: Utc::now(),
            source: String::new(),
            data: Value::Null,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// 호스트 명의로 발행된 이벤트인지
    pub fn is_from_host(&self) -> bool {
        self.source == host::SOURCE
    }
}

// ============================================================================
// 사전 정의 이벤트
// ============================================================================

/// 호스트 발행 이벤트
pub mod host {
    use super::*;

    pub const SOURCE: &str = "host";
    pub const UNIT_CHANGE: &str = "unitChange";
    pub const PRECISION_CHANGE: &str = "precisionChange";
    pub const PLUGIN_INSTALLED: &str = "pluginInstalled";
    pub const PLUGIN_UNINSTALLED: &str = "pluginUninstalled";

    pub fn unit_change(previous: Unit, current: Unit) -> EditorEvent {
        EditorEvent::new(UNIT_CHANGE, EventCategory::Unit)
            .with_source(SOURCE)
            .with_data(json!({ "previous": previous, "unit": current }))
    }

    pub fn precision_change(precision: u32) -> EditorEvent {
        EditorEvent::new(PRECISION_CHANGE, EventCategory::Unit)
            .with_source(SOURCE)
            .with_data(json!({ "precision": precision }))
    }

    pub fn plugin_installed(plugin: &str) -> EditorEvent {
        EditorEvent::new(PLUGIN_INSTALLED, EventCategory::Host)
            .with_source(SOURCE)
            .with_data(json!({ "plugin": plugin }))
    }

    pub fn plugin_uninstalled(plugin: &str) -> EditorEvent {
        EditorEvent::new(PLUGIN_UNINSTALLED, EventCategory::Host)
            .with_source(SOURCE)
            .with_data(json!({ "plugin": plugin }))
    }
}

/// 플러그인 발행 이벤트
pub mod plugin {
    use super::*;

    pub fn emitted(plugin: &str, name: &str, data: Value) -> EditorEvent {
        EditorEvent::new(name, EventCategory::Plugin)
            .with_source(plugin)
            .with_data(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_change_payload() {
        let event = host::unit_change(Unit::Pixel, Unit::Millimeter);
        assert_eq!(event.name, "unitChange");
        assert_eq!(event.category, EventCategory::Unit);
        assert_eq!(event.data["unit"], "mm");
        assert_eq!(event.data["previous"], "px");
        assert!(event.is_from_host());
        assert!(!plugin::emitted("Ruler", "rulerEnabled", Value::Null).is_from_host());
    }
}
