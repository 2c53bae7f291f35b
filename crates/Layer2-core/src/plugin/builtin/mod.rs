//! # Builtin Plugins
//!
//! 기본 제공 플러그인. 모두 일반 플러그인과 같은 경로(`PluginHost::install`)로 설치됩니다.
//!
//! | 플러그인 | 기여 |
//! |----------|------|
//! | `UnitPlugin` | 단위 변환 API, origin-size 조회/설정 |
//! | `RulerPlugin` | 눈금자 상태, 저장 전후 가이드라인 숨김/복원 |
//! | `MoveHotKeyPlugin` | 방향키 1px 이동 |
//! | `DeleteHotKeyPlugin` | `del` API, backspace, 메뉴 |
//! | `CenterAlignPlugin` | 작업 영역 기준 정렬 |
//! | `CreateElementPlugin` | 현재 단위로 도형 생성 (다른 플러그인 API 사용, 마지막에 설치) |

pub mod center_align;
pub mod create_element;
pub mod delete_hotkey;
pub mod move_hotkey;
pub mod ruler;
pub mod unit;

use super::{PluginDescriptor, PluginHost};
use crate::surface::{DrawingSurface, EntityId};
use easel_foundation::{Error, Measure, Result, Unit};
use serde_json::{Map, Value};

/// 설치 순서대로의 기본 플러그인
pub fn descriptors() -> Vec<PluginDescriptor> {
    vec![
        unit::descriptor(),
        ruler::descriptor(),
        move_hotkey::descriptor(),
        delete_hotkey::descriptor(),
        center_align::descriptor(),
        create_element::descriptor(),
    ]
}

/// 기본 플러그인 전부 설치
pub async fn install_all(host: &PluginHost) -> Result<()> {
    for descriptor in descriptors() {
        host.install(descriptor, Value::Null).await?;
    }
    Ok(())
}

// ============================================================================
// API 인자 헬퍼
// ============================================================================

/// 인자 (null은 없음으로 취급)
pub(crate) fn arg(args: &[Value], index: usize) -> Option<&Value> {
    args.get(index).filter(|value| !value.is_null())
}

/// 엔티티 ID 인자 - 없으면 활성 엔티티
pub(crate) fn entity_arg(
    args: &[Value],
    index: usize,
    surface: &dyn DrawingSurface,
) -> Result<EntityId> {
    match arg(args, index) {
        Some(Value::String(id)) => Ok(EntityId::named(id.as_str())),
        Some(other) => Err(Error::InvalidInput(format!(
            "expected entity id at argument {}, got {}",
            index, other
        ))),
        None => surface
            .active()
            .ok_or_else(|| Error::InvalidInput("no entity given and nothing is active".into())),
    }
}

/// 단위 인자 (선택)
pub(crate) fn unit_arg(args: &[Value], index: usize) -> Result<Option<Unit>> {
    match arg(args, index) {
        None => Ok(None),
        Some(Value::String(name)) => name.parse().map(Some).map_err(Error::InvalidInput),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(Error::from),
    }
}

/// 숫자 또는 숫자 문자열 인자
pub(crate) fn number_arg(args: &[Value], index: usize, name: &str) -> Result<f64> {
    match arg(args, index) {
        Some(Value::Number(n)) => Measure::Number(n.as_f64().unwrap_or(f64::NAN)).normalize(name),
        Some(Value::String(text)) => Measure::Text(text).normalize(name),
        Some(other) => Err(Error::invalid_measurement(name, other.to_string())),
        None => Err(Error::invalid_measurement(name, "")),
    }
}

/// 선택 숫자 인자
pub(crate) fn optional_number_arg(args: &[Value], index: usize, name: &str) -> Result<Option<f64>> {
    match arg(args, index) {
        None => Ok(None),
        Some(_) => number_arg(args, index, name).map(Some),
    }
}

/// 객체 인자 (없으면 빈 객체)
pub(crate) fn object_arg(args: &[Value], index: usize) -> Result<Map<String, Value>> {
    match arg(args, index) {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(Error::InvalidInput(format!(
            "expected object at argument {}, got {}",
            index, other
        ))),
    }
}

/// 문자열 인자
pub(crate) fn string_arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str> {
    arg(args, index)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidInput(format!("missing string argument '{}'", name)))
}
