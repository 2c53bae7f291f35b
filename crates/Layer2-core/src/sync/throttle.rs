//! 엔티티별 throttle

use crate::surface::EntityId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// 엔티티마다 최소 간격을 보장하는 throttle
///
/// 첫 호출은 항상 통과하고, 이후에는 마지막 통과 시점으로부터
/// `interval`이 지나야 다시 통과합니다.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Mutex<HashMap<EntityId, Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 지금 실행해도 되는지 확인 (통과 시 시점 기록)
    pub fn ready(&self, entity: &EntityId) -> bool {
        self.ready_at(entity, Instant::now())
    }

    pub fn ready_at(&self, entity: &EntityId, now: Instant) -> bool {
        let mut last = self.last.lock();
        match last.get(entity) {
            Some(previous) if now.saturating_duration_since(*previous) < self.interval => false,
            _ => {
                last.insert(entity.clone(), now);
                true
            }
        }
    }

    /// 엔티티 기록 제거 (다음 호출은 즉시 통과)
    pub fn reset(&self, entity: &EntityId) {
        self.last.lock().remove(entity);
    }

    pub fn clear(&self) {
        self.last.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_throttle_interval() {
        let throttle = Throttle::new(Duration::from_millis(30));
        let a = EntityId::named("a");
        let b = EntityId::named("b");

        assert!(throttle.ready(&a));
        assert!(!throttle.ready(&a));
        // 다른 엔티티는 독립
        assert!(throttle.ready(&b));

        tokio::time::advance(Duration::from_millis(29)).await;
        assert!(!throttle.ready(&a));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(throttle.ready(&a));

        throttle.reset(&a);
        assert!(throttle.ready(&a));
    }
}
