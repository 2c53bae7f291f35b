//! Unit State - 현재 표시 단위와 자리수
//!
//! 프로세스 전역으로 하나를 공유하거나 (`UnitState::global()`),
//! 호스트마다 독립된 상태를 생성해 사용할 수 있습니다.
//! 변경은 `tokio::sync::watch` 채널로 구독합니다.

use super::Unit;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;
use tracing::debug;

/// 기본 표시 자리수
pub const DEFAULT_PRECISION: u32 = 2;

/// 단위 설정 스냅샷
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSetting {
    pub unit: Unit,
    pub precision: u32,
}

impl Default for UnitSetting {
    fn default() -> Self {
        Self {
            unit: Unit::Pixel,
            precision: DEFAULT_PRECISION,
        }
    }
}

/// 공유 단위 상태
pub struct UnitState {
    current: RwLock<UnitSetting>,
    sender: watch::Sender<UnitSetting>,
}

impl std::fmt::Debug for UnitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitState")
            .field("current", &*self.current.read())
            .finish()
    }
}

impl UnitState {
    pub fn new(initial: UnitSetting) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            current: RwLock::new(initial),
            sender,
        }
    }

    /// 공유 가능한 새 상태
    pub fn shared(initial: UnitSetting) -> Arc<Self> {
        Arc::new(Self::new(initial))
    }

    /// 프로세스 전역 상태
    pub fn global() -> Arc<UnitState> {
        static GLOBAL_UNIT_STATE: OnceLock<Arc<UnitState>> = OnceLock::new();
        GLOBAL_UNIT_STATE
            .get_or_init(|| UnitState::shared(UnitSetting::default()))
            .clone()
    }

    pub fn current(&self) -> UnitSetting {
        *self.current.read()
    }

    pub fn unit(&self) -> Unit {
        self.current.read().unit
    }

    pub fn precision(&self) -> u32 {
        self.current.read().precision
    }

    /// 단위 변경 - 이전 단위 반환
    pub fn set_unit(&self, unit: Unit) -> Unit {
        let previous = {
            let mut current = self.current.write();
            let previous = current.unit;
            current.unit = unit;
            previous
        };
        if previous != unit {
            debug!("Unit changed: {} -> {}", previous, unit);
        }
        self.publish();
        previous
    }

    pub fn set_precision(&self, precision: u32) {
        self.current.write().precision = precision;
        self.publish();
    }

    /// 변경 구독
    pub fn subscribe(&self) -> watch::Receiver<UnitSetting> {
        self.sender.subscribe()
    }

    fn publish(&self) {
        let setting = self.current();
        // 구독자가 없어도 값은 갱신
        self.sender.send_replace(setting);
    }
}

impl Default for UnitState {
    fn default() -> Self {
        Self::new(UnitSetting::default())
    }
}
