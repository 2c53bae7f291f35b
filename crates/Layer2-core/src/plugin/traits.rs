//! Plugin traits - 핵심 플러그인 인터페이스

use super::menu::MenuEntry;
use async_trait::async_trait;
use easel_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// KeyEvent - 외부 키 캡처가 전달하는 원본 이벤트
// ============================================================================

/// 키 이벤트 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPhase {
    Down,
    Up,
}

/// 키 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    pub phase: KeyPhase,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyEvent {
    pub fn down(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            phase: KeyPhase::Down,
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    pub fn up(key: impl Into<String>) -> Self {
        Self {
            phase: KeyPhase::Up,
            ..Self::down(key)
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn is_down(&self) -> bool {
        self.phase == KeyPhase::Down
    }
}

// ============================================================================
// Plugin Trait - 모든 플러그인이 구현해야 하는 인터페이스
// ============================================================================

/// 플러그인 트레이트
///
/// 인스턴스는 설치 시 `PluginDescriptor`의 생성자로 한 번 만들어집니다.
/// 선언한 API는 `call_api`로, lifecycle lane은 `on_hook`으로 전달됩니다.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// 플러그인 이름
    fn name(&self) -> &str;

    /// 구현한 lifecycle lane 이름
    ///
    /// 호스트가 인식하지 않는 lane은 무시됩니다.
    fn hooks(&self) -> Vec<String> {
        vec![]
    }

    /// lane 핸들러
    ///
    /// `Some(payload)`를 반환하면 다음 핸들러가 받는 payload를 교체합니다.
    async fn on_hook(&self, _lane: &str, _payload: Value) -> Result<Option<Value>> {
        Ok(None)
    }

    /// 선언한 API 호출
    async fn call_api(&self, api: &str, _args: Vec<Value>) -> Result<Value> {
        Err(Error::ApiNotImplemented {
            plugin: self.name().to_string(),
            api: api.to_string(),
        })
    }

    /// 선언한 단축키 콜백
    fn on_hotkey(&self, _key: &str, _event: &KeyEvent) {}

    /// 우클릭 메뉴 기여 (None이면 기여하지 않음)
    fn context_menu(&self) -> Option<Vec<MenuEntry>> {
        None
    }

    /// 제거 시 호출 (리소스 해제)
    async fn destroy(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BarePlugin;

    #[async_trait]
    impl Plugin for BarePlugin {
        fn name(&self) -> &str {
            "BarePlugin"
        }
    }

    #[tokio::test]
    async fn test_defaults() {
        let plugin = BarePlugin;
        assert!(plugin.hooks().is_empty());
        assert!(plugin.context_menu().is_none());
        assert_eq!(plugin.on_hook("hookSaveBefore", Value::Null).await.unwrap(), None);

        let err = plugin.call_api("del", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::ApiNotImplemented { ref api, .. } if api == "del"));
    }

    #[test]
    fn test_key_event_phase() {
        assert!(KeyEvent::down("left").is_down());
        assert!(!KeyEvent::up("left").is_down());
        let event: KeyEvent = serde_json::from_str(r#"{"key":"up","phase":"down"}"#).unwrap();
        assert_eq!(event, KeyEvent::down("up"));
    }
}
