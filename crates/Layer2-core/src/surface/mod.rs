//! # Drawing Surface
//!
//! 외부 그래픽 엔진이 소유하는 canonical 캔버스에 대한 계약입니다.
//! 코어는 엔티티 열거, px 기하 읽기/쓰기, 변경 신호 구독만 사용하고
//! 렌더링은 하지 않습니다.
//!
//! - `types.rs` - EntityId, Geometry, SurfaceSignal
//! - `memory.rs` - 메모리 구현 (테스트, CLI 데모, 임베더 참고용)

mod memory;
mod types;

pub use memory::MemorySurface;
pub use types::{
    fields, finite_number, kinds, EntityId, EntityRecord, Geometry, Point, SignalKind, SubscriptionId,
    SurfaceListener, SurfaceSignal,
};

use crate::Result;

/// 캔버스 계약
///
/// 모든 기하 값은 px 단위입니다. 구현체는 리스너를 호출하기 전에
/// 내부 락을 풀어야 합니다 (리스너가 다시 surface를 읽을 수 있음).
pub trait DrawingSurface: Send + Sync {
    /// 모든 엔티티 ID (추가 순서)
    fn entities(&self) -> Vec<EntityId>;

    /// 엔티티 조회
    fn entity(&self, id: &EntityId) -> Option<EntityRecord>;

    /// canonical 기하 조회
    fn geometry(&self, id: &EntityId) -> Option<Geometry> {
        self.entity(id).map(|record| record.geometry)
    }

    /// canonical 기하 patch 적용 후 `kind` 신호 발행
    fn set_geometry(&self, id: &EntityId, patch: &Geometry, kind: SignalKind) -> Result<()>;

    /// 엔티티 추가 (Settle 신호 발행)
    fn add(&self, kind: &str, geometry: Geometry) -> EntityId {
        let id = EntityId::new();
        self.add_with_id(id.clone(), kind, geometry);
        id
    }

    /// 지정한 ID로 엔티티 추가 (Settle 신호 발행)
    fn add_with_id(&self, id: EntityId, kind: &str, geometry: Geometry);

    /// 엔티티 삭제 (Removed 신호 발행)
    fn remove(&self, id: &EntityId) -> Result<()>;

    /// 선택된 엔티티
    fn active(&self) -> Option<EntityId>;

    fn set_active(&self, id: Option<EntityId>);

    /// 변경 신호 구독
    fn subscribe(&self, listener: SurfaceListener) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// 기하 변경 없이 신호만 발행 (예: 드래그 종료)
    fn signal(&self, id: &EntityId, kind: SignalKind) -> Result<()>;
}
