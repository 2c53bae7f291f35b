//! Unit Converter - px ↔ mm/inch/pt 변환
//!
//! DPI 결정 순서: 명시적 인자 → 측정된 디바이스 DPI (캐시) → 기본값.
//! 픽셀을 만드는 변환은 기본적으로 올림(ceil)하고, `Rounding::Direct`일 때만 소수를 유지합니다.
//! mm/inch를 만드는 변환은 절대 반올림하지 않습니다 (자리수 처리는 `precision` 모듈 담당).

use super::Unit;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// 1 inch = 25.4 mm
pub const INCH_TO_MM: f64 = 25.4;

/// 1 inch = 72 pt
pub const POINTS_PER_INCH: f64 = 72.0;

/// 기본 DPI
pub const DEFAULT_DPI: f64 = 96.0;

pub const STANDARD_DPI_SCREEN: f64 = 96.0;
pub const STANDARD_DPI_PRINT: f64 = 300.0;
pub const STANDARD_DPI_HIGH_RES: f64 = 600.0;

/// 디바이스 DPI 측정 함수 (디스플레이를 아는 외부 협력자가 제공)
pub type DpiDetector = Arc<dyn Fn() -> Option<f64> + Send + Sync>;

// ============================================================================
// Measure - 숫자 또는 숫자 문자열 입력
// ============================================================================

/// 변환 입력값
///
/// 숫자와 숫자 문자열(공백 허용)을 모두 받습니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure<'a> {
    Number(f64),
    Text(&'a str),
}

impl Measure<'_> {
    /// 유효한 숫자로 정규화
    ///
    /// 빈 문자열, 숫자가 아닌 문자열, NaN, 무한대는 `InvalidMeasurement`
    pub fn normalize(self, name: &str) -> Result<f64> {
        match self {
            Measure::Number(value) if value.is_finite() => Ok(value),
            Measure::Number(value) => Err(Error::invalid_measurement(name, value.to_string())),
            Measure::Text(text) => match text.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(Error::invalid_measurement(name, text)),
            },
        }
    }
}

impl From<f64> for Measure<'_> {
    fn from(value: f64) -> Self {
        Measure::Number(value)
    }
}

impl From<f32> for Measure<'_> {
    fn from(value: f32) -> Self {
        Measure::Number(value as f64)
    }
}

impl From<i32> for Measure<'_> {
    fn from(value: i32) -> Self {
        Measure::Number(value as f64)
    }
}

impl From<u32> for Measure<'_> {
    fn from(value: u32) -> Self {
        Measure::Number(value as f64)
    }
}

impl<'a> From<&'a str> for Measure<'a> {
    fn from(value: &'a str) -> Self {
        Measure::Text(value)
    }
}

impl<'a> From<&'a String> for Measure<'a> {
    fn from(value: &'a String) -> Self {
        Measure::Text(value.as_str())
    }
}

/// 픽셀 결과 반올림 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// 정수 픽셀로 올림 (래스터 배치 시 서브픽셀 틈 방지)
    Ceil,
    /// 반올림 없이 그대로
    Direct,
}

impl Default for Rounding {
    fn default() -> Self {
        Self::Ceil
    }
}

impl Rounding {
    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Ceil => value.ceil(),
            Self::Direct => value,
        }
    }
}

// ============================================================================
// UnitConverter
// ============================================================================

/// 단위 변환기
pub struct UnitConverter {
    /// 측정 실패 시 사용하는 기본 DPI
    default_dpi: f64,

    /// 디바이스 DPI 측정 함수
    detector: Option<DpiDetector>,

    /// 측정된 디바이스 DPI (reset_cache 전까지 유지)
    device_dpi: RwLock<Option<f64>>,
}

impl std::fmt::Debug for UnitConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitConverter")
            .field("default_dpi", &self.default_dpi)
            .field("has_detector", &self.detector.is_some())
            .field("device_dpi", &*self.device_dpi.read())
            .finish()
    }
}

impl UnitConverter {
    /// 새 변환기 생성
    pub fn new(default_dpi: f64) -> Self {
        let default_dpi = if default_dpi.is_finite() && default_dpi > 0.0 {
            default_dpi
        } else {
            warn!("Invalid default DPI {}, falling back to {}", default_dpi, DEFAULT_DPI);
            DEFAULT_DPI
        };

        Self {
            default_dpi,
            detector: None,
            device_dpi: RwLock::new(None),
        }
    }

    /// 디바이스 DPI 측정 함수 설정
    pub fn with_detector(mut self, detector: DpiDetector) -> Self {
        self.detector = Some(detector);
        self
    }

    /// 프로세스 전역 변환기
    pub fn global() -> &'static UnitConverter {
        static GLOBAL_CONVERTER: OnceLock<UnitConverter> = OnceLock::new();
        GLOBAL_CONVERTER.get_or_init(|| UnitConverter::new(DEFAULT_DPI))
    }

    pub fn default_dpi(&self) -> f64 {
        self.default_dpi
    }

    // ========================================================================
    // DPI
    // ========================================================================

    /// 디바이스 DPI (측정 결과를 캐시)
    pub fn device_dpi(&self) -> f64 {
        if let Some(dpi) = *self.device_dpi.read() {
            return dpi;
        }

        let measured = self
            .detector
            .as_ref()
            .and_then(|detector| detector())
            .filter(|dpi| dpi.is_finite() && *dpi > 0.0);

        let dpi = match measured {
            Some(dpi) => dpi,
            None => {
                if self.detector.is_some() {
                    warn!("Cannot measure device DPI, using default: {}", self.default_dpi);
                }
                self.default_dpi
            }
        };

        debug!("Device DPI resolved to {}", dpi);
        *self.device_dpi.write() = Some(dpi);
        dpi
    }

    /// 디바이스 DPI 캐시 초기화 (디스플레이 변경 시)
    pub fn reset_cache(&self) {
        *self.device_dpi.write() = None;
    }

    /// 유효한 DPI 결정
    pub fn resolve_dpi(&self, dpi: Option<f64>) -> Result<f64> {
        let dpi = match dpi {
            Some(dpi) => Measure::Number(dpi).normalize("dpi")?,
            None => self.device_dpi(),
        };

        if !dpi.is_finite() || dpi <= 0.0 {
            return Err(Error::InvalidDpi(dpi));
        }
        Ok(dpi)
    }

    // ========================================================================
    // mm
    // ========================================================================

    /// 밀리미터 → 픽셀
    pub fn mm_to_px<'a>(
        &self,
        mm: impl Into<Measure<'a>>,
        dpi: Option<f64>,
        rounding: Rounding,
    ) -> Result<f64> {
        let mm = mm.into().normalize("mm")?;
        let dpi = self.resolve_dpi(dpi)?;
        Ok(rounding.apply(mm * dpi / INCH_TO_MM))
    }

    /// 픽셀 → 밀리미터
    pub fn px_to_mm<'a>(&self, px: impl Into<Measure<'a>>, dpi: Option<f64>) -> Result<f64> {
        let px = px.into().normalize("px")?;
        let dpi = self.resolve_dpi(dpi)?;
        Ok(px * INCH_TO_MM / dpi)
    }

    /// 밀리미터 배열 → 픽셀 배열 (올림)
    pub fn mm_to_px_batch(&self, values: &[f64], dpi: Option<f64>) -> Result<Vec<f64>> {
        values
            .iter()
            .map(|mm| self.mm_to_px(*mm, dpi, Rounding::Ceil))
            .collect()
    }

    /// 픽셀 배열 → 밀리미터 배열
    pub fn px_to_mm_batch(&self, values: &[f64], dpi: Option<f64>) -> Result<Vec<f64>> {
        values.iter().map(|px| self.px_to_mm(*px, dpi)).collect()
    }

    // ========================================================================
    // inch (mm 경유)
    // ========================================================================

    /// 인치 → 픽셀
    pub fn inch_to_px<'a>(
        &self,
        inch: impl Into<Measure<'a>>,
        dpi: Option<f64>,
        rounding: Rounding,
    ) -> Result<f64> {
        let inch = inch.into().normalize("inch")?;
        self.mm_to_px(inch * INCH_TO_MM, dpi, rounding)
    }

    /// 픽셀 → 인치
    pub fn px_to_inch<'a>(&self, px: impl Into<Measure<'a>>, dpi: Option<f64>) -> Result<f64> {
        Ok(self.px_to_mm(px, dpi)? / INCH_TO_MM)
    }

    // ========================================================================
    // pt (항상 디바이스 DPI 사용)
    // ========================================================================

    /// 포인트 → 픽셀
    pub fn pt_to_px<'a>(&self, pt: impl Into<Measure<'a>>, rounding: Rounding) -> Result<f64> {
        let pt = pt.into().normalize("pt")?;
        let dpi = self.resolve_dpi(None)?;
        Ok(rounding.apply(pt * dpi / POINTS_PER_INCH))
    }

    /// 픽셀 → 포인트
    pub fn px_to_pt<'a>(&self, px: impl Into<Measure<'a>>) -> Result<f64> {
        let px = px.into().normalize("px")?;
        let dpi = self.resolve_dpi(None)?;
        Ok(px * POINTS_PER_INCH / dpi)
    }

    /// 밀리미터 → 포인트 (DPI 무관)
    pub fn mm_to_pt<'a>(&self, mm: impl Into<Measure<'a>>) -> Result<f64> {
        let mm = mm.into().normalize("mm")?;
        Ok(mm * POINTS_PER_INCH / INCH_TO_MM)
    }

    // ========================================================================
    // Unit 기반 일반 변환
    // ========================================================================

    /// 픽셀 → 지정 단위 (Pixel은 그대로)
    pub fn px_to_unit<'a>(
        &self,
        px: impl Into<Measure<'a>>,
        unit: Unit,
        dpi: Option<f64>,
    ) -> Result<f64> {
        match unit {
            Unit::Pixel => px.into().normalize("px"),
            Unit::Millimeter => self.px_to_mm(px, dpi),
            Unit::Inch => self.px_to_inch(px, dpi),
        }
    }

    /// 지정 단위 → 픽셀 (Pixel은 그대로)
    pub fn unit_to_px<'a>(
        &self,
        value: impl Into<Measure<'a>>,
        unit: Unit,
        dpi: Option<f64>,
        rounding: Rounding,
    ) -> Result<f64> {
        match unit {
            Unit::Pixel => value.into().normalize("px"),
            Unit::Millimeter => self.mm_to_px(value, dpi, rounding),
            Unit::Inch => self.inch_to_px(value, dpi, rounding),
        }
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}
