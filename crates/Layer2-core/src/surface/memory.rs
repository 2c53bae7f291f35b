//! Memory Surface - 메모리 기반 캔버스

use super::types::{
    kinds, EntityId, EntityRecord, Geometry, SignalKind, SubscriptionId, SurfaceListener,
    SurfaceSignal,
};
use super::DrawingSurface;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

#[derive(Default)]
struct SurfaceState {
    /// 추가 순서
    order: Vec<EntityId>,
    entities: HashMap<EntityId, EntityRecord>,
    active: Option<EntityId>,
}

/// 메모리 캔버스
pub struct MemorySurface {
    state: RwLock<SurfaceState>,
    listeners: RwLock<Vec<(SubscriptionId, SurfaceListener)>>,
    listener_counter: AtomicU64,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SurfaceState::default()),
            listeners: RwLock::new(Vec::new()),
            listener_counter: AtomicU64::new(0),
        }
    }

    /// 작업 영역 엔티티를 포함한 캔버스
    pub fn with_workspace(width: f64, height: f64) -> Self {
        let surface = Self::new();
        surface.insert(
            EntityId::workspace(),
            kinds::WORKSPACE,
            Geometry::new()
                .with(super::fields::LEFT, 0.0)
                .with(super::fields::TOP, 0.0)
                .with(super::fields::WIDTH, width)
                .with(super::fields::HEIGHT, height),
        );
        surface
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.state.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 신호 없이 삽입
    fn insert(&self, id: EntityId, kind: &str, geometry: Geometry) -> Geometry {
        let mut state = self.state.write();
        if !state.entities.contains_key(&id) {
            state.order.push(id.clone());
        }
        state.entities.insert(
            id.clone(),
            EntityRecord {
                id,
                kind: kind.to_string(),
                geometry: geometry.clone(),
            },
        );
        geometry
    }

    /// 락 없이 리스너 호출
    fn notify(&self, signal: SurfaceSignal) {
        let listeners: Vec<SurfaceListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        trace!(entity = %signal.entity, kind = ?signal.kind, "Surface signal");
        for listener in listeners {
            listener(&signal);
        }
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingSurface for MemorySurface {
    fn entities(&self) -> Vec<EntityId> {
        self.state.read().order.clone()
    }

    fn entity(&self, id: &EntityId) -> Option<EntityRecord> {
        self.state.read().entities.get(id).cloned()
    }

    fn set_geometry(&self, id: &EntityId, patch: &Geometry, kind: SignalKind) -> Result<()> {
        let geometry = {
            let mut state = self.state.write();
            let record = state
                .entities
                .get_mut(id)
                .ok_or_else(|| Error::EntityNotFound(id.to_string()))?;
            record.geometry.merge(patch);
            record.geometry.clone()
        };

        self.notify(SurfaceSignal {
            entity: id.clone(),
            kind,
            geometry: Some(geometry),
        });
        Ok(())
    }

    fn add_with_id(&self, id: EntityId, kind: &str, geometry: Geometry) {
        let geometry = self.insert(id.clone(), kind, geometry);
        self.notify(SurfaceSignal {
            entity: id,
            kind: SignalKind::Settle,
            geometry: Some(geometry),
        });
    }

    fn remove(&self, id: &EntityId) -> Result<()> {
        {
            let mut state = self.state.write();
            if state.entities.remove(id).is_none() {
                return Err(Error::EntityNotFound(id.to_string()));
            }
            state.order.retain(|existing| existing != id);
            if state.active.as_ref() == Some(id) {
                state.active = None;
            }
        }

        self.notify(SurfaceSignal {
            entity: id.clone(),
            kind: SignalKind::Removed,
            geometry: None,
        });
        Ok(())
    }

    fn active(&self) -> Option<EntityId> {
        self.state.read().active.clone()
    }

    fn set_active(&self, id: Option<EntityId>) {
        self.state.write().active = id;
    }

    fn subscribe(&self, listener: SurfaceListener) -> SubscriptionId {
        let id = SubscriptionId(self.listener_counter.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn signal(&self, id: &EntityId, kind: SignalKind) -> Result<()> {
        let geometry = match kind {
            SignalKind::Removed => None,
            _ => Some(
                self.geometry(id)
                    .ok_or_else(|| Error::EntityNotFound(id.to_string()))?,
            ),
        };

        self.notify(SurfaceSignal {
            entity: id.clone(),
            kind,
            geometry,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::fields;
    use parking_lot::Mutex;

    fn recording(surface: &MemorySurface) -> Arc<Mutex<Vec<SurfaceSignal>>> {
        let signals = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&signals);
        surface.subscribe(Arc::new(move |signal: &SurfaceSignal| {
            sink.lock().push(signal.clone());
        }));
        signals
    }

    #[test]
    fn test_add_update_remove_signals() {
        let surface = MemorySurface::new();
        let signals = recording(&surface);

        let id = surface.add("rect", Geometry::new().with(fields::LEFT, 1.0));
        surface
            .set_geometry(&id, &Geometry::new().with(fields::LEFT, 5.0), SignalKind::Continuous)
            .unwrap();
        surface.remove(&id).unwrap();

        let kinds: Vec<SignalKind> = signals.lock().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SignalKind::Settle, SignalKind::Continuous, SignalKind::Removed]
        );
        assert_eq!(
            signals.lock()[1].geometry.as_ref().unwrap().number(fields::LEFT),
            Some(5.0)
        );
        assert!(surface.is_empty());
    }

    #[test]
    fn test_listener_can_read_surface() {
        let surface = Arc::new(MemorySurface::new());
        let reader = Arc::clone(&surface);
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        surface.subscribe(Arc::new(move |signal: &SurfaceSignal| {
            *sink.lock() = reader.geometry(&signal.entity);
        }));

        let id = surface.add("rect", Geometry::new().with(fields::WIDTH, 40.0));
        assert_eq!(seen.lock().as_ref().unwrap().number(fields::WIDTH), Some(40.0));
        assert!(surface.entity(&id).is_some());
    }

    #[test]
    fn test_missing_entity() {
        let surface = MemorySurface::with_workspace(800.0, 600.0);
        let missing = EntityId::named("nope");

        assert!(matches!(
            surface.set_geometry(&missing, &Geometry::new(), SignalKind::Settle),
            Err(Error::EntityNotFound(_))
        ));
        assert!(surface.remove(&missing).is_err());
        assert_eq!(surface.entities(), vec![EntityId::workspace()]);
    }

    #[test]
    fn test_remove_clears_active() {
        let surface = MemorySurface::new();
        let id = surface.add("rect", Geometry::new());
        surface.set_active(Some(id.clone()));
        surface.remove(&id).unwrap();
        assert!(surface.active().is_none());
    }
}
