//! Plugin Descriptor - 설치 단위 정의

use super::host::HostHandle;
use super::traits::Plugin;
use crate::surface::DrawingSurface;
use easel_foundation::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// 플러그인 생성자
pub type PluginConstructor =
    Arc<dyn Fn(PluginContext) -> Result<Arc<dyn Plugin>> + Send + Sync>;

// ============================================================================
// PluginContext - 생성자에 주입되는 참조
// ============================================================================

/// 플러그인 생성 컨텍스트
#[derive(Clone)]
pub struct PluginContext {
    /// canonical 캔버스
    pub surface: Arc<dyn DrawingSurface>,

    /// 호스트 (약한 참조 - 플러그인이 호스트 수명을 붙잡지 않음)
    pub host: HostHandle,

    /// 설치 옵션
    pub options: Value,
}

impl PluginContext {
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.option(key).and_then(Value::as_bool)
    }

    pub fn option_f64(&self, key: &str) -> Option<f64> {
        self.option(key).and_then(Value::as_f64)
    }
}

// ============================================================================
// PluginDescriptor
// ============================================================================

/// 플러그인 설치 설명자
///
/// 이름과 선언한 capability(이벤트, API, 단축키), 그리고 생성자로 구성됩니다.
///
/// ```ignore
/// let descriptor = PluginDescriptor::new("DeleteHotKeyPlugin", |ctx| {
///     Ok(Arc::new(DeleteHotKeyPlugin::new(ctx)) as Arc<dyn Plugin>)
/// })
/// .with_apis(["del"])
/// .with_hotkeys(["backspace"]);
/// ```
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub events: Vec<String>,
    pub apis: Vec<String>,
    pub hotkeys: Vec<String>,
    constructor: PluginConstructor,
}

impl PluginDescriptor {
    pub fn new(
        name: impl Into<String>,
        constructor: impl Fn(PluginContext) -> Result<Arc<dyn Plugin>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
            apis: Vec::new(),
            hotkeys: Vec::new(),
            constructor: Arc::new(constructor),
        }
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.events.extend(events.into_iter().map(Into::into));
        self
    }

    pub fn with_apis(mut self, apis: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.apis.extend(apis.into_iter().map(Into::into));
        self
    }

    /// 단축키 이름은 소문자로 저장
    pub fn with_hotkeys(mut self, hotkeys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hotkeys
            .extend(hotkeys.into_iter().map(|key| key.into().to_lowercase()));
        self
    }

    /// 인스턴스 생성
    pub fn construct(&self, ctx: PluginContext) -> Result<Arc<dyn Plugin>> {
        (self.constructor)(ctx)
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("events", &self.events)
            .field("apis", &self.apis)
            .field("hotkeys", &self.hotkeys)
            .finish()
    }
}

/// 설치된 플러그인 요약 (CLI 출력용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub name: String,
    pub events: Vec<String>,
    pub apis: Vec<String>,
    pub hotkeys: Vec<String>,
    /// 실제 등록된 lane
    pub hooks: Vec<String>,
    pub load_order: usize,
}
