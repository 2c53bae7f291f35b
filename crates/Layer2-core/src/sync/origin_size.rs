//! Origin Size Synchronizer - 엔티티별 단위 스냅샷 캐시
//!
//! canonical px 기하로부터 각 단위(mm, inch)의 표시/저장용 값을 계산해 보관합니다.
//!
//! - Settle 신호: 즉시, 항상 동기화
//! - Continuous 신호: 엔티티별 throttle (기본 30ms), 중간 신호는 버려질 수 있음
//! - Removed 신호: 엔티티 기록 삭제
//!
//! 저장값은 반올림하지 않습니다. 자리수는 `display_snapshot`에서만 적용됩니다.

use super::throttle::Throttle;
use crate::surface::{
    finite_number, DrawingSurface, EntityId, Geometry, Point, SignalKind, SubscriptionId,
    SurfaceSignal,
};
use crate::Result;
use easel_foundation::{
    format_precision, FieldPolicy, HostConfig, Measure, Rounding, Unit, UnitConverter, UnitState,
    INCH_TO_MM,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

// ============================================================================
// 타입
// ============================================================================

/// 한 단위에서 본 엔티티 값
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// 길이 필드(변환됨)와 비기하 필드(그대로)
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,

    /// 플러그인 전용 payload (동기화가 건드리지 않음)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extension: Map<String, Value>,
}

impl UnitSnapshot {
    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    /// 다른 스냅샷의 필드를 덮어씀 (없는 필드는 유지, extension은 병합)
    pub fn merge(&mut self, other: UnitSnapshot) {
        self.values.extend(other.values);
        if other.points.is_some() {
            self.points = other.points;
        }
        self.extension.extend(other.extension);
    }
}

/// 엔티티의 단위별 기록
pub type OriginSizeMap = BTreeMap<Unit, UnitSnapshot>;

/// 동기화 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub settle: u64,
    pub continuous: u64,
    /// throttle로 버려진 continuous 신호
    pub dropped: u64,
}

/// 계산만 끝나고 아직 기록되지 않은 단위 재계산
#[derive(Debug)]
pub struct PendingResync {
    unit: Unit,
    snapshots: Vec<(EntityId, UnitSnapshot)>,
    /// surface에서 사라진 엔티티
    missing: Vec<EntityId>,
}

impl PendingResync {
    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[derive(Default)]
struct Counters {
    settle: AtomicU64,
    continuous: AtomicU64,
    dropped: AtomicU64,
}

// ============================================================================
// OriginSizeSynchronizer
// ============================================================================

/// 단위 스냅샷 동기화기
pub struct OriginSizeSynchronizer {
    converter: Arc<UnitConverter>,
    units: Arc<UnitState>,
    policy: FieldPolicy,
    /// 고정 DPI (None이면 변환기의 디바이스 DPI)
    dpi: Option<f64>,
    throttle: Throttle,
    records: RwLock<HashMap<EntityId, OriginSizeMap>>,
    counters: Counters,
}

impl OriginSizeSynchronizer {
    pub fn new(
        converter: Arc<UnitConverter>,
        units: Arc<UnitState>,
        policy: FieldPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            converter,
            units,
            policy,
            dpi: None,
            throttle: Throttle::new(interval),
            records: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn from_config(
        config: &HostConfig,
        converter: Arc<UnitConverter>,
        units: Arc<UnitState>,
    ) -> Self {
        Self::new(
            converter,
            units,
            config.field_policy.clone(),
            Duration::from_millis(config.continuous_sync_interval_ms),
        )
    }

    /// 고정 DPI 설정 (테스트, 인쇄 미리보기)
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    /// surface 신호 구독
    pub fn attach(self: &Arc<Self>, surface: &dyn DrawingSurface) -> SubscriptionId {
        let weak: Weak<Self> = Arc::downgrade(self);
        surface.subscribe(Arc::new(move |signal: &SurfaceSignal| {
            if let Some(sync) = weak.upgrade() {
                sync.handle_signal(signal);
            }
        }))
    }

    // ========================================================================
    // 신호 처리
    // ========================================================================

    /// surface 신호 처리
    pub fn handle_signal(&self, signal: &SurfaceSignal) {
        let result = match (signal.kind, &signal.geometry) {
            (SignalKind::Removed, _) => {
                self.remove(&signal.entity);
                Ok(())
            }
            (SignalKind::Settle, Some(geometry)) => self.settle(&signal.entity, geometry),
            (SignalKind::Continuous, Some(geometry)) => {
                self.continuous(&signal.entity, geometry).map(|_| ())
            }
            (_, None) => Ok(()),
        };

        if let Err(e) = result {
            warn!(entity = %signal.entity, "Origin size sync failed: {}", e);
        }
    }

    /// 확정 동기화 (항상 실행)
    pub fn settle(&self, entity: &EntityId, geometry: &Geometry) -> Result<()> {
        self.sync_unit(entity, geometry, self.units.unit())?;
        self.throttle.reset(entity);
        self.counters.settle.fetch_add(1, Ordering::Relaxed);
        trace!(entity = %entity, "Settle sync");
        Ok(())
    }

    /// 연속 동기화 (throttle) - 실행 여부 반환
    pub fn continuous(&self, entity: &EntityId, geometry: &Geometry) -> Result<bool> {
        if !self.throttle.ready(entity) {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(false);
        }

        self.sync_unit(entity, geometry, self.units.unit())?;
        self.counters.continuous.fetch_add(1, Ordering::Relaxed);
        trace!(entity = %entity, "Continuous sync");
        Ok(true)
    }

    /// 추적 중인 모든 엔티티를 canonical px에서 다시 계산
    ///
    /// 이전 단위의 기록을 거치지 않으므로 반올림 오차가 누적되지 않습니다.
    /// 한 엔티티라도 계산에 실패하면 아무 기록도 바뀌지 않습니다.
    pub fn resync_all(&self, surface: &dyn DrawingSurface, unit: Unit) -> Result<usize> {
        let pending = self.prepare_resync(surface, unit)?;
        Ok(self.commit_resync(pending))
    }

    /// 새 단위 스냅샷을 기록하지 않고 모두 계산
    pub fn prepare_resync(&self, surface: &dyn DrawingSurface, unit: Unit) -> Result<PendingResync> {
        let mut pending = PendingResync {
            unit,
            snapshots: Vec::new(),
            missing: Vec::new(),
        };
        for entity in self.tracked() {
            match surface.geometry(&entity) {
                Some(geometry) => {
                    let snapshot = self.compute(&geometry, unit)?;
                    pending.snapshots.push((entity, snapshot));
                }
                None => pending.missing.push(entity),
            }
        }
        Ok(pending)
    }

    /// `prepare_resync` 결과 반영 - 기록된 엔티티 수 반환
    pub fn commit_resync(&self, pending: PendingResync) -> usize {
        for entity in &pending.missing {
            self.remove(entity);
        }
        let synced = pending.snapshots.len();
        for (entity, snapshot) in pending.snapshots {
            self.record(&entity, pending.unit, snapshot);
        }
        debug!(unit = %pending.unit, entities = synced, "Resynced origin sizes");
        synced
    }

    fn sync_unit(&self, entity: &EntityId, geometry: &Geometry, unit: Unit) -> Result<()> {
        let snapshot = self.compute(geometry, unit)?;
        self.record(entity, unit, snapshot);
        Ok(())
    }

    // ========================================================================
    // 변환
    // ========================================================================

    /// px 기하 → 단위 스냅샷 (반올림 없음)
    ///
    /// 숫자로 읽을 수 없는 길이 필드(예: `"auto"`)는 변환하지 않고 그대로 기록합니다.
    pub fn compute(&self, geometry: &Geometry, unit: Unit) -> Result<UnitSnapshot> {
        let mut snapshot = UnitSnapshot::default();

        for (name, value) in &geometry.fields {
            let pixels = match measure_of(value) {
                Some(measure) if self.policy.is_length_field(name) => measure.normalize(name).ok(),
                _ => None,
            };
            let converted = match pixels {
                Some(px) => finite_number(name, self.converter.px_to_unit(px, unit, self.dpi)?)?,
                None => {
                    if self.policy.is_length_field(name) {
                        trace!(field = %name, "Keeping non-numeric length field");
                    }
                    value.clone()
                }
            };
            snapshot.values.insert(name.clone(), converted);
        }

        if let Some(points) = &geometry.points {
            snapshot.points = Some(if self.policy.convert_points {
                points
                    .iter()
                    .map(|p| {
                        Ok(Point::new(
                            self.converter.px_to_unit(p.x, unit, self.dpi)?,
                            self.converter.px_to_unit(p.y, unit, self.dpi)?,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                points.clone()
            });
        }

        Ok(snapshot)
    }

    /// 단위 patch → px patch (반올림 없음)
    pub fn to_pixels(&self, patch: &Geometry, unit: Unit, dpi: Option<f64>) -> Result<Geometry> {
        let dpi = dpi.or(self.dpi);
        let mut pixels = Geometry::new();

        for (name, value) in &patch.fields {
            let converted = match (self.policy.is_length_field(name), measure_of(value)) {
                (true, Some(measure)) => finite_number(
                    name,
                    self.converter
                        .unit_to_px(measure, unit, dpi, Rounding::Direct)?,
                )?,
                _ => value.clone(),
            };
            pixels.fields.insert(name.clone(), converted);
        }

        if let Some(points) = &patch.points {
            pixels.points = Some(if self.policy.convert_points {
                points
                    .iter()
                    .map(|p| {
                        Ok(Point::new(
                            self.converter.unit_to_px(p.x, unit, dpi, Rounding::Direct)?,
                            self.converter.unit_to_px(p.y, unit, dpi, Rounding::Direct)?,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                points.clone()
            });
        }

        Ok(pixels)
    }

    // ========================================================================
    // 쓰기 경로
    // ========================================================================

    /// canonical px setter
    pub fn apply_px(
        &self,
        surface: &dyn DrawingSurface,
        entity: &EntityId,
        patch: &Geometry,
    ) -> Result<()> {
        surface.set_geometry(entity, patch, SignalKind::Settle)
    }

    /// 단위 setter - px로 변환해 `apply_px` 호출 후 입력값을 그대로 기록
    ///
    /// inch 입력은 mm 기록도 함께 남깁니다.
    pub fn apply_in_unit(
        &self,
        surface: &dyn DrawingSurface,
        entity: &EntityId,
        unit: Unit,
        patch: &Geometry,
        dpi: Option<f64>,
    ) -> Result<()> {
        let pixels = self.to_pixels(patch, unit, dpi)?;
        self.apply_px(surface, entity, &pixels)?;

        if unit.is_pixel() {
            return Ok(());
        }

        let given = self.given_snapshot(patch, 1.0)?;
        self.record(entity, unit, given);

        if unit == Unit::Inch {
            let millimeters = self.given_snapshot(patch, INCH_TO_MM)?;
            self.record(entity, Unit::Millimeter, millimeters);
        }

        Ok(())
    }

    /// patch를 스냅샷으로 (길이 필드는 `scale` 배)
    fn given_snapshot(&self, patch: &Geometry, scale: f64) -> Result<UnitSnapshot> {
        let mut snapshot = UnitSnapshot::default();
        for (name, value) in &patch.fields {
            let recorded = match (self.policy.is_length_field(name), measure_of(value)) {
                (true, Some(measure)) => finite_number(name, measure.normalize(name)? * scale)?,
                _ => value.clone(),
            };
            snapshot.values.insert(name.clone(), recorded);
        }
        if let Some(points) = &patch.points {
            snapshot.points = Some(if self.policy.convert_points {
                points
                    .iter()
                    .map(|p| Point::new(p.x * scale, p.y * scale))
                    .collect()
            } else {
                points.clone()
            });
        }
        Ok(snapshot)
    }

    // ========================================================================
    // 기록
    // ========================================================================

    fn record(&self, entity: &EntityId, unit: Unit, snapshot: UnitSnapshot) {
        let mut records = self.records.write();
        records
            .entry(entity.clone())
            .or_default()
            .entry(unit)
            .or_default()
            .merge(snapshot);
    }

    /// 단위 기록 직접 설정 (기존 필드와 병합)
    pub fn set_origin_size(&self, entity: &EntityId, unit: Unit, snapshot: UnitSnapshot) {
        self.record(entity, unit, snapshot);
    }

    /// 엔티티의 전체 기록
    pub fn origin_size(&self, entity: &EntityId) -> Option<OriginSizeMap> {
        self.records.read().get(entity).cloned()
    }

    /// 한 단위의 기록
    pub fn snapshot(&self, entity: &EntityId, unit: Unit) -> Option<UnitSnapshot> {
        self.records
            .read()
            .get(entity)
            .and_then(|map| map.get(&unit))
            .cloned()
    }

    /// 표시용 기록 (자리수 적용, None이면 현재 설정)
    pub fn display_snapshot(
        &self,
        entity: &EntityId,
        unit: Unit,
        precision: Option<u32>,
    ) -> Option<Value> {
        let snapshot = self.snapshot(entity, unit)?;
        let digits = precision.unwrap_or_else(|| self.units.precision());
        let value = serde_json::to_value(snapshot).ok()?;
        Some(format_precision(&value, digits))
    }

    /// extension 병합 (다른 필드는 건드리지 않음)
    pub fn merge_extension(&self, entity: &EntityId, unit: Unit, extension: Map<String, Value>) {
        let mut records = self.records.write();
        records
            .entry(entity.clone())
            .or_default()
            .entry(unit)
            .or_default()
            .extension
            .extend(extension);
    }

    /// 엔티티 기록 삭제
    pub fn remove(&self, entity: &EntityId) -> bool {
        self.throttle.reset(entity);
        let removed = self.records.write().remove(entity).is_some();
        if removed {
            trace!(entity = %entity, "Dropped origin size");
        }
        removed
    }

    /// 추적 중인 엔티티
    pub fn tracked(&self) -> Vec<EntityId> {
        let mut entities: Vec<EntityId> = self.records.read().keys().cloned().collect();
        entities.sort();
        entities
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            settle: self.counters.settle.load(Ordering::Relaxed),
            continuous: self.counters.continuous.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.records.write().clear();
        self.throttle.clear();
    }
}

fn measure_of(value: &Value) -> Option<Measure<'_>> {
    match value {
        Value::Number(n) => n.as_f64().map(Measure::Number),
        Value::String(s) => Some(Measure::Text(s.as_str())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{fields, MemorySurface};
    use easel_foundation::UnitSetting;
    use serde_json::json;

    fn setup(unit: Unit) -> (Arc<MemorySurface>, Arc<OriginSizeSynchronizer>, Arc<UnitState>) {
        let surface = Arc::new(MemorySurface::new());
        let units = UnitState::shared(UnitSetting {
            unit,
            precision: 2,
        });
        let sync = Arc::new(
            OriginSizeSynchronizer::new(
                Arc::new(UnitConverter::new(96.0)),
                Arc::clone(&units),
                FieldPolicy::default(),
                Duration::from_millis(30),
            )
            .with_dpi(96.0),
        );
        sync.attach(surface.as_ref());
        (surface, sync, units)
    }

    fn rect() -> Geometry {
        Geometry::new()
            .with(fields::LEFT, 96.0)
            .with(fields::TOP, 48.0)
            .with(fields::WIDTH, 192.0)
            .with(fields::HEIGHT, 96.0)
            .with_value(fields::FILL, json!("#00ff00"))
    }

    #[test]
    fn test_settle_converts_length_fields_only() {
        let (surface, sync, _) = setup(Unit::Millimeter);
        let id = surface.add("rect", rect());

        let snapshot = sync.snapshot(&id, Unit::Millimeter).unwrap();
        assert!((snapshot.number(fields::LEFT).unwrap() - 25.4).abs() < 1e-9);
        assert!((snapshot.number(fields::WIDTH).unwrap() - 50.8).abs() < 1e-9);
        assert_eq!(snapshot.values.get(fields::FILL), Some(&json!("#00ff00")));
        assert_eq!(sync.stats().settle, 1);
    }

    #[test]
    fn test_extension_survives_recompute() {
        let (surface, sync, _) = setup(Unit::Millimeter);
        let id = surface.add("rect", rect());

        let mut extension = Map::new();
        extension.insert("barcode".into(), json!({"format": "CODE128"}));
        sync.merge_extension(&id, Unit::Millimeter, extension);

        surface
            .set_geometry(&id, &Geometry::new().with(fields::LEFT, 192.0), SignalKind::Settle)
            .unwrap();

        let snapshot = sync.snapshot(&id, Unit::Millimeter).unwrap();
        assert!((snapshot.number(fields::LEFT).unwrap() - 50.8).abs() < 1e-9);
        assert_eq!(snapshot.extension["barcode"]["format"], "CODE128");
    }

    #[test]
    fn test_points_converted() {
        let (surface, sync, _) = setup(Unit::Inch);
        let id = surface.add(
            "polygon",
            Geometry::new().with_points(vec![Point::new(0.0, 0.0), Point::new(96.0, 192.0)]),
        );

        let points = sync.snapshot(&id, Unit::Inch).unwrap().points.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert!((points[1].x - 1.0).abs() < 1e-9);
        assert!((points[1].y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_removed_drops_record() {
        let (surface, sync, _) = setup(Unit::Millimeter);
        let id = surface.add("rect", rect());
        assert!(sync.origin_size(&id).is_some());

        surface.remove(&id).unwrap();
        assert!(sync.origin_size(&id).is_none());
        assert!(sync.tracked().is_empty());
    }

    #[test]
    fn test_apply_in_inch_records_inch_and_mm() {
        let (surface, sync, _) = setup(Unit::Inch);
        let id = surface.add("rect", rect());

        sync.apply_in_unit(
            surface.as_ref(),
            &id,
            Unit::Inch,
            &Geometry::new().with(fields::WIDTH, 3.0),
            None,
        )
        .unwrap();

        let width_px = surface.geometry(&id).unwrap().number(fields::WIDTH).unwrap();
        assert!((width_px - 288.0).abs() < 1e-9);
        assert_eq!(
            sync.snapshot(&id, Unit::Inch).unwrap().number(fields::WIDTH),
            Some(3.0)
        );
        let mm = sync.snapshot(&id, Unit::Millimeter).unwrap();
        assert!((mm.number(fields::WIDTH).unwrap() - 76.2).abs() < 1e-9);
    }

    #[test]
    fn test_apply_in_unit_rejects_bad_measurement() {
        let (surface, sync, _) = setup(Unit::Millimeter);
        let id = surface.add("rect", rect());

        let err = sync
            .apply_in_unit(
                surface.as_ref(),
                &id,
                Unit::Millimeter,
                &Geometry::new().with_value(fields::WIDTH, json!("wide")),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, crate::Error::InvalidMeasurement { .. }));
        // 실패한 쓰기는 canonical 기하를 바꾸지 않음
        assert_eq!(surface.geometry(&id).unwrap().number(fields::WIDTH), Some(192.0));
    }

    #[test]
    fn test_display_snapshot_rounds_only_output() {
        let (surface, sync, _) = setup(Unit::Millimeter);
        let id = surface.add("rect", Geometry::new().with(fields::LEFT, 100.0));

        let display = sync.display_snapshot(&id, Unit::Millimeter, None).unwrap();
        assert_eq!(display["left"], json!(26.46));

        let stored = sync.snapshot(&id, Unit::Millimeter).unwrap();
        assert!((stored.number(fields::LEFT).unwrap() - 26.458333333333332).abs() < 1e-12);
    }

    #[test]
    fn test_resync_derives_from_pixels() {
        let (surface, sync, units) = setup(Unit::Pixel);
        let id = surface.add("rect", rect());

        units.set_unit(Unit::Millimeter);
        assert_eq!(sync.resync_all(surface.as_ref(), Unit::Millimeter).unwrap(), 1);

        let snapshot = sync.snapshot(&id, Unit::Millimeter).unwrap();
        assert!((snapshot.number(fields::TOP).unwrap() - 12.7).abs() < 1e-9);
        assert_eq!(
            sync.snapshot(&id, Unit::Pixel).unwrap().number(fields::TOP),
            Some(48.0)
        );
    }

    #[test]
    fn test_apply_in_unit_rejects_infinite_measurement() {
        let (surface, sync, _) = setup(Unit::Millimeter);
        let id = surface.add("rect", rect());

        for width in [json!("inf"), json!("-Infinity")] {
            let err = sync
                .apply_in_unit(
                    surface.as_ref(),
                    &id,
                    Unit::Millimeter,
                    &Geometry::new().with_value(fields::WIDTH, width),
                    None,
                )
                .unwrap_err();
            assert!(matches!(err, crate::Error::InvalidMeasurement { .. }));
        }
        assert_eq!(surface.geometry(&id).unwrap().number(fields::WIDTH), Some(192.0));
    }

    #[test]
    fn test_settle_keeps_non_numeric_length_field() {
        let (surface, sync, _) = setup(Unit::Millimeter);
        let id = surface.add(
            "text",
            Geometry::new()
                .with(fields::LEFT, 96.0)
                .with_value(fields::WIDTH, json!("auto")),
        );

        let snapshot = sync.snapshot(&id, Unit::Millimeter).unwrap();
        assert!((snapshot.number(fields::LEFT).unwrap() - 25.4).abs() < 1e-9);
        assert_eq!(snapshot.values.get(fields::WIDTH), Some(&json!("auto")));
    }

    #[test]
    fn test_resync_is_all_or_nothing() {
        let (surface, sync, _) = setup(Unit::Pixel);
        let small = surface.add("rect", Geometry::new().with(fields::WIDTH, 1.0));
        surface.add("rect", Geometry::new().with(fields::WIDTH, 1e10));

        // 극단적으로 작은 DPI에서 큰 값은 무한대로 넘침
        let tiny = OriginSizeSynchronizer::new(
            Arc::new(UnitConverter::new(96.0)),
            UnitState::shared(UnitSetting::default()),
            FieldPolicy::default(),
            Duration::from_millis(30),
        )
        .with_dpi(1e-300);
        for entity in sync.tracked() {
            let geometry = surface.geometry(&entity).unwrap();
            tiny.set_origin_size(&entity, Unit::Pixel, tiny.compute(&geometry, Unit::Pixel).unwrap());
        }

        let err = tiny.resync_all(surface.as_ref(), Unit::Millimeter).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidMeasurement { .. }));
        assert!(tiny.snapshot(&small, Unit::Millimeter).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_throttled_then_settle_exact() {
        let (surface, sync, _) = setup(Unit::Millimeter);
        let id = surface.add("rect", rect());

        for step in 0..100 {
            let left = 96.0 + step as f64;
            surface
                .set_geometry(
                    &id,
                    &Geometry::new().with(fields::LEFT, left),
                    SignalKind::Continuous,
                )
                .unwrap();
            tokio::time::advance(Duration::from_millis(2)).await;
        }

        let stats = sync.stats();
        assert!(stats.continuous < 100);
        assert!(stats.continuous > 0);
        assert_eq!(stats.continuous + stats.dropped, 100);

        surface.signal(&id, SignalKind::Settle).unwrap();

        let expected = UnitConverter::new(96.0).px_to_mm(195.0, Some(96.0)).unwrap();
        let snapshot = sync.snapshot(&id, Unit::Millimeter).unwrap();
        assert_eq!(snapshot.number(fields::LEFT), Some(expected));
    }
}
