//! Units - 측정 단위 변환 및 전역 단위 상태
//!
//! - `convert.rs` - px ↔ mm/inch/pt 변환 (DPI 기반)
//! - `precision.rs` - 표시/저장용 소수점 자리수 처리
//! - `state.rs` - 프로세스 전역 단위 설정 + 변경 구독
//!
//! ## 사용법
//!
//! ```ignore
//! use easel_foundation::units::{UnitConverter, Rounding};
//!
//! let converter = UnitConverter::new(96.0);
//! let px = converter.mm_to_px(10.0, Some(96.0), Rounding::Ceil)?;   // 38
//! let mm = converter.px_to_mm(px, Some(96.0))?;
//! ```

mod convert;
mod precision;
mod state;

pub use convert::{
    DpiDetector, Measure, Rounding, UnitConverter, DEFAULT_DPI, INCH_TO_MM, POINTS_PER_INCH,
    STANDARD_DPI_HIGH_RES, STANDARD_DPI_PRINT, STANDARD_DPI_SCREEN,
};
pub use precision::{format_precision, round_to};
pub use state::{UnitSetting, UnitState, DEFAULT_PRECISION};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 측정 단위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Unit {
    /// 디바이스 픽셀 (canonical)
    #[serde(rename = "px")]
    Pixel,
    /// 밀리미터
    #[serde(rename = "mm")]
    Millimeter,
    /// 인치
    #[serde(rename = "inch")]
    Inch,
}

impl Unit {
    /// 모든 단위
    pub const ALL: [Unit; 3] = [Unit::Pixel, Unit::Millimeter, Unit::Inch];

    /// 단위 문자열 반환 (직렬화 이름과 동일)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pixel => "px",
            Self::Millimeter => "mm",
            Self::Inch => "inch",
        }
    }

    /// 표시용 라벨
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pixel => "px",
            Self::Millimeter => "mm",
            Self::Inch => "in",
        }
    }

    /// canonical 단위인지 확인
    pub fn is_pixel(&self) -> bool {
        matches!(self, Self::Pixel)
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::Pixel
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "px" | "pixel" | "pixels" => Ok(Self::Pixel),
            "mm" | "millimeter" | "millimeters" => Ok(Self::Millimeter),
            "in" | "inch" | "inches" => Ok(Self::Inch),
            _ => Err(format!("Unknown unit: {}", s)),
        }
    }
}
