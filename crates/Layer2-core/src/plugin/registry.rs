//! Capability Registry - 이벤트/API 이름 공간 관리
//!
//! 설치된 플러그인들이 점유한 이벤트 이름과 API 이름을 추적하고 충돌을 거부합니다.
//! 충돌 검사는 전부-아니면-전무: 하나라도 충돌하면 아무것도 점유하지 않습니다.
//! 호스트 예약 이름은 따로 보관되어 `release`/`clear`로 풀리지 않습니다.

use easel_foundation::{CapabilityKind, Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// 호스트 예약 이름의 소유자
pub const HOST_OWNER: &str = "host";

/// 이름 공간 원장
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    /// 이벤트 이름 -> 소유 플러그인
    events: BTreeMap<String, String>,

    /// API 이름 -> 소유 플러그인
    apis: BTreeMap<String, String>,

    /// 호스트 메서드 이름 (소유자 `host`)
    reserved: BTreeSet<String>,

    /// 설치된 플러그인 이름
    installed: HashSet<String>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 호스트 메서드 이름을 미리 점유
    pub fn with_reserved(apis: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut registry = Self::new();
        registry.reserve(apis);
        registry
    }

    pub fn reserve(&mut self, apis: impl IntoIterator<Item = impl Into<String>>) {
        self.reserved.extend(apis.into_iter().map(Into::into));
    }

    // ========================================================================
    // 설치 여부
    // ========================================================================

    /// 같은 이름의 두 번째 설치 거부 (`host`는 항상 설치된 것으로 취급)
    pub fn check_installed(&self, plugin: &str) -> Result<()> {
        if plugin == HOST_OWNER || self.installed.contains(plugin) {
            return Err(Error::DuplicatePlugin {
                plugin: plugin.to_string(),
            });
        }
        Ok(())
    }

    pub fn is_installed(&self, plugin: &str) -> bool {
        self.installed.contains(plugin)
    }

    // ========================================================================
    // 점유 / 해제
    // ========================================================================

    /// 설치 검사 + 이름 점유 (전부-아니면-전무)
    ///
    /// 성공하면 플러그인을 설치됨으로 표시합니다.
    pub fn claim(&mut self, plugin: &str, events: &[String], apis: &[String]) -> Result<()> {
        self.check_installed(plugin)?;

        for name in events {
            if let Some(owner) = self.events.get(name) {
                return Err(Error::conflict(plugin, CapabilityKind::Event, name, owner));
            }
        }
        for name in apis {
            if let Some(owner) = self.api_owner(name) {
                return Err(Error::conflict(plugin, CapabilityKind::Api, name, owner));
            }
        }

        for name in events {
            self.events.insert(name.clone(), plugin.to_string());
        }
        for name in apis {
            self.apis.insert(name.clone(), plugin.to_string());
        }
        self.installed.insert(plugin.to_string());

        debug!(
            plugin = %plugin,
            events = events.len(),
            apis = apis.len(),
            "Claimed capabilities"
        );
        Ok(())
    }

    /// 플러그인이 점유한 모든 이름 해제 - 해제 여부 반환
    pub fn release(&mut self, plugin: &str) -> bool {
        self.events.retain(|_, owner| owner != plugin);
        self.apis.retain(|_, owner| owner != plugin);
        self.installed.remove(plugin)
    }

    /// 예약 이름을 제외한 모든 점유 해제
    pub fn clear(&mut self) {
        self.events.clear();
        self.apis.clear();
        self.installed.clear();
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn event_owner(&self, event: &str) -> Option<&str> {
        self.events.get(event).map(String::as_str)
    }

    pub fn api_owner(&self, api: &str) -> Option<&str> {
        if self.reserved.contains(api) {
            return Some(HOST_OWNER);
        }
        self.apis.get(api).map(String::as_str)
    }

    pub fn is_reserved(&self, api: &str) -> bool {
        self.reserved.contains(api)
    }

    /// 점유된 이벤트 이름 (정렬)
    pub fn events(&self) -> Vec<String> {
        self.events.keys().cloned().collect()
    }

    /// 점유된 API 이름 (정렬, 예약 이름 포함)
    pub fn apis(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.apis.keys().chain(&self.reserved).collect();
        names.into_iter().cloned().collect()
    }
}
