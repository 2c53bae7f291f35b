//! Precision - 소수점 자리수 처리
//!
//! 저장값은 항상 반올림 없이 유지하고, 표시할 때만 적용합니다.

use serde_json::{Number, Value};

/// 지정한 소수점 자리수로 반올림 (0.5는 0에서 먼 쪽으로)
pub fn round_to(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(digits as i32);
    let rounded = (value * factor).round() / factor;
    // 자리수가 너무 커서 factor가 overflow되면 원본 유지
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// JSON 값 안의 모든 숫자를 재귀적으로 반올림
///
/// 배열과 객체는 구조를 유지하고, 숫자가 아닌 값은 그대로 둡니다.
pub fn format_precision(value: &Value, digits: u32) -> Value {
    match value {
        Value::Number(number) => match number.as_f64() {
            Some(f) if !(number.is_i64() || number.is_u64()) => Number::from_f64(round_to(f, digits))
                .map(Value::Number)
                .unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| format_precision(item, digits))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), format_precision(item, digits)))
                .collect(),
        ),
        other => other.clone(),
    }
}
