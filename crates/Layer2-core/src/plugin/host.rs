//! Plugin Host - 플러그인 설치, API 노출, lifecycle 실행, 메뉴 집계
//!
//! ## 설치 흐름
//!
//! ```text
//! install(descriptor, options)
//!   1. 실행 중인 lane이 있으면 HostBusy
//!   2. CapabilityRegistry.claim (중복 설치 / 이름 충돌 검사, 전부-아니면-전무)
//!   3. 생성자 호출 (surface, host handle, options)
//!   4. 구현한 lane마다 HookPipeline.register
//!   5. 선언한 단축키 바인딩
//!   6. 선언한 API를 호스트 메서드로 노출
//!   7. 설치 순서 테이블에 기록
//! ```
//!
//! 3~4단계에서 실패하면 앞 단계의 등록을 모두 되돌립니다.

use super::descriptor::{PluginContext, PluginDescriptor, PluginInfo};
use super::menu::MenuEntry;
use super::registry::{CapabilityRegistry, HOST_OWNER};
use super::table::PluginTable;
use super::traits::{KeyEvent, Plugin};
use crate::hook::{HookHandler, HookPipeline, LaneRun};
use crate::surface::{DrawingSurface, MemorySurface, SubscriptionId};
use crate::sync::OriginSizeSynchronizer;
use easel_foundation::event::types::{host as host_events, plugin as plugin_events};
use easel_foundation::{
    DpiDetector, Error, EventBus, EventFilter, EventListener, HostConfig, ListenerId, Result, Unit,
    UnitConverter, UnitSetting, UnitState, DEFAULT_PRECISION,
};
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use tokio::sync::{RwLock as LifecycleLock, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// 호스트가 직접 제공하는 메서드 이름 (플러그인 API로 선언 불가)
pub const RESERVED_METHODS: [&str; 11] = [
    "install",
    "uninstall",
    "getPlugin",
    "run",
    "collectMenu",
    "setUnit",
    "getUnit",
    "setPrecision",
    "getPrecision",
    "emit",
    "on",
];

/// 호스트에 노출된 플러그인 API
pub type ApiMethod = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// 단축키 콜백
pub type HotkeyCallback = Arc<dyn Fn(&str, &KeyEvent) + Send + Sync>;

#[derive(Clone)]
struct BoundApi {
    owner: String,
    method: ApiMethod,
}

#[derive(Clone)]
struct HotkeyBinding {
    owner: String,
    callback: HotkeyCallback,
}

struct HostInner {
    config: HostConfig,
    surface: Arc<dyn DrawingSurface>,
    converter: Arc<UnitConverter>,
    units: Arc<UnitState>,
    events: Arc<EventBus>,

    /// 이름 공간 원장
    registry: Mutex<CapabilityRegistry>,

    /// lifecycle lane
    pipeline: HookPipeline,

    /// API 이름 -> 바인딩된 메서드
    apis: RwLock<HashMap<String, BoundApi>>,

    /// 키 이름 -> 바인딩 (설치 순서)
    hotkeys: RwLock<BTreeMap<String, Vec<HotkeyBinding>>>,

    plugins: PluginTable,
    sync: Arc<OriginSizeSynchronizer>,
    subscription: Mutex<Option<SubscriptionId>>,

    /// lane 실행은 read, 설치/제거는 write
    lifecycle: LifecycleLock<()>,
}

// ============================================================================
// HostHandle - 플러그인이 보관하는 약한 참조
// ============================================================================

/// 호스트 약한 참조
#[derive(Clone)]
pub struct HostHandle {
    inner: Weak<HostInner>,
}

impl HostHandle {
    /// 호스트 없이 생성 (단독 플러그인 테스트용)
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    pub fn upgrade(&self) -> Result<PluginHost> {
        self.inner
            .upgrade()
            .map(|inner| PluginHost { inner })
            .ok_or(Error::HostDropped)
    }
}

// ============================================================================
// HostBuilder
// ============================================================================

/// 호스트 빌더
#[derive(Default)]
pub struct HostBuilder {
    config: HostConfig,
    surface: Option<Arc<dyn DrawingSurface>>,
    detector: Option<DpiDetector>,
    converter: Option<Arc<UnitConverter>>,
    units: Option<Arc<UnitState>>,
    events: Option<Arc<EventBus>>,
    fixed_dpi: Option<f64>,
}

impl HostBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn surface(mut self, surface: Arc<dyn DrawingSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// 디바이스 DPI 측정 함수
    pub fn dpi_detector(mut self, detector: DpiDetector) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn converter(mut self, converter: Arc<UnitConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// 단위 상태 공유 (예: `UnitState::global()`)
    pub fn unit_state(mut self, units: Arc<UnitState>) -> Self {
        self.units = Some(units);
        self
    }

    pub fn event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// 동기화에 고정 DPI 사용
    pub fn fixed_dpi(mut self, dpi: f64) -> Self {
        self.fixed_dpi = Some(dpi);
        self
    }

    pub fn build(self) -> Result<PluginHost> {
        self.config.validate()?;
        let config = self.config;

        let surface = self
            .surface
            .unwrap_or_else(|| Arc::new(MemorySurface::new()) as Arc<dyn DrawingSurface>);

        let converter = match self.converter {
            Some(converter) => converter,
            None => {
                let converter = UnitConverter::new(config.default_dpi);
                Arc::new(match self.detector {
                    Some(detector) => converter.with_detector(detector),
                    None => converter,
                })
            }
        };

        let units = self.units.unwrap_or_else(|| {
            UnitState::shared(UnitSetting {
                unit: config.default_unit,
                precision: config.precision.unwrap_or(DEFAULT_PRECISION),
            })
        });

        let events = self.events.unwrap_or_else(|| Arc::new(EventBus::new()));

        let mut sync =
            OriginSizeSynchronizer::from_config(&config, Arc::clone(&converter), Arc::clone(&units));
        if let Some(dpi) = self.fixed_dpi {
            sync = sync.with_dpi(dpi);
        }
        let sync = Arc::new(sync);
        let subscription = sync.attach(surface.as_ref());

        debug!(lanes = ?config.lanes, dpi = config.default_dpi, "Building plugin host");

        Ok(PluginHost {
            inner: Arc::new(HostInner {
                pipeline: HookPipeline::from_config(&config),
                registry: Mutex::new(CapabilityRegistry::with_reserved(RESERVED_METHODS)),
                apis: RwLock::new(HashMap::new()),
                hotkeys: RwLock::new(BTreeMap::new()),
                plugins: PluginTable::new(),
                subscription: Mutex::new(Some(subscription)),
                lifecycle: LifecycleLock::new(()),
                config,
                surface,
                converter,
                units,
                events,
                sync,
            }),
        })
    }
}

// ============================================================================
// PluginHost
// ============================================================================

/// 플러그인 호스트
///
/// 복제하면 같은 호스트를 가리킵니다.
///
/// ```ignore
/// let host = PluginHost::builder().surface(surface).build()?;
/// host.install(builtin::delete_hotkey::descriptor(), json!({})).await?;
///
/// host.invoke("del", vec![]).await?;
/// host.run("hookSaveBefore", json!({})).await?;
/// let menu = host.collect_menu();
/// ```
#[derive(Clone)]
pub struct PluginHost {
    inner: Arc<HostInner>,
}

impl PluginHost {
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    /// 기본 설정으로 생성
    pub fn new(surface: Arc<dyn DrawingSurface>) -> Result<Self> {
        Self::builder().surface(surface).build()
    }

    pub fn handle(&self) -> HostHandle {
        HostHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ========================================================================
    // 설치 / 제거
    // ========================================================================

    /// 플러그인 설치
    pub async fn install(&self, descriptor: PluginDescriptor, options: Value) -> Result<()> {
        let inner = &self.inner;
        let name = descriptor.name.clone();

        let _exclusive = self.exclusive("install")?;
        inner
            .registry
            .lock()
            .claim(&name, &descriptor.events, &descriptor.apis)?;

        let ctx = PluginContext {
            surface: Arc::clone(&inner.surface),
            host: self.handle(),
            options,
        };

        let plugin = match descriptor.construct(ctx) {
            Ok(plugin) => plugin,
            Err(e) => {
                warn!(plugin = %name, "Plugin constructor failed: {}", e);
                inner.registry.lock().release(&name);
                return Err(e);
            }
        };

        let hooks = match self.register_hooks(&name, &plugin) {
            Ok(hooks) => hooks,
            Err(e) => {
                warn!(plugin = %name, "Hook registration failed: {}", e);
                self.detach(&name);
                return Err(e);
            }
        };

        {
            let mut hotkeys = inner.hotkeys.write();
            for key in &descriptor.hotkeys {
                let target = Arc::clone(&plugin);
                hotkeys.entry(key.clone()).or_default().push(HotkeyBinding {
                    owner: name.clone(),
                    callback: Arc::new(move |key: &str, event: &KeyEvent| {
                        target.on_hotkey(key, event)
                    }),
                });
            }
        }

        {
            let mut apis = inner.apis.write();
            for api in &descriptor.apis {
                apis.insert(
                    api.clone(),
                    BoundApi {
                        owner: name.clone(),
                        method: bind_api(Arc::clone(&plugin), api.clone()),
                    },
                );
            }
        }

        let info = PluginInfo {
            name: name.clone(),
            events: descriptor.events.clone(),
            apis: descriptor.apis.clone(),
            hotkeys: descriptor.hotkeys.clone(),
            hooks,
            load_order: inner.plugins.next_order(),
        };
        inner.plugins.insert(plugin, info);

        inner
            .events
            .publish(host_events::plugin_installed(&name))
            .await;
        Ok(())
    }

    fn register_hooks(&self, name: &str, plugin: &Arc<dyn Plugin>) -> Result<Vec<String>> {
        let mut registered: Vec<String> = Vec::new();
        for lane in plugin.hooks() {
            if registered.contains(&lane) {
                continue;
            }
            if !self.inner.pipeline.is_lane(&lane) {
                warn!(plugin = %name, lane = %lane, "Ignoring hook for unrecognised lane");
                continue;
            }
            self.inner
                .pipeline
                .register(&lane, name, bind_hook(Arc::clone(plugin), lane.clone()))?;
            registered.push(lane);
        }
        Ok(registered)
    }

    /// 플러그인 제거 - 설치되어 있지 않았으면 false
    pub async fn uninstall(&self, name: &str) -> Result<bool> {
        let exclusive = self.exclusive("uninstall")?;

        self.detach(name);
        let removed = self.inner.plugins.remove(name);
        drop(exclusive);

        // destroy 안에서 호스트를 다시 호출할 수 있도록 잠금 해제 후 실행
        let Some(plugin) = removed else {
            return Ok(false);
        };

        if let Err(e) = plugin.destroy().await {
            warn!(plugin = %name, "Plugin destroy failed: {}", e);
        }

        self.inner
            .events
            .publish(host_events::plugin_uninstalled(name))
            .await;
        Ok(true)
    }

    /// lane, 단축키, API, 원장에서 플러그인 흔적 제거
    fn detach(&self, name: &str) {
        let inner = &self.inner;
        inner.pipeline.unregister(name);

        {
            let mut hotkeys = inner.hotkeys.write();
            for bindings in hotkeys.values_mut() {
                bindings.retain(|binding| binding.owner != name);
            }
            hotkeys.retain(|_, bindings| !bindings.is_empty());
        }

        inner.apis.write().retain(|_, bound| bound.owner != name);
        inner.registry.lock().release(name);
    }

    /// 진행 중인 lane 실행이나 다른 설치/제거가 없을 때만 획득
    fn exclusive(&self, operation: &str) -> Result<RwLockWriteGuard<'_, ()>> {
        self.inner.lifecycle.try_write().map_err(|_| {
            Error::HostBusy(format!(
                "cannot {} while a lane run or another install is in flight",
                operation
            ))
        })
    }

    /// 설치된 플러그인 인스턴스
    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.inner.plugins.get(name)
    }

    /// 설치 순서대로의 플러그인 이름
    pub fn plugin_names(&self) -> Vec<String> {
        self.inner.plugins.names()
    }

    pub fn plugin_infos(&self) -> Vec<PluginInfo> {
        self.inner.plugins.infos()
    }

    pub fn plugin_count(&self) -> usize {
        self.inner.plugins.len()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// lane 실행 - 최종 payload 반환
    pub async fn run(&self, lane: &str, payload: Value) -> Result<Value> {
        self.run_traced(lane, payload).await.map(|run| run.payload)
    }

    /// lane 실행 - 실행 기록 포함
    pub async fn run_traced(&self, lane: &str, payload: Value) -> Result<LaneRun> {
        let _running = self.inner.lifecycle.read().await;
        let run = self.inner.pipeline.run_traced(lane, payload).await?;
        debug!(lane = %lane, executed = ?run.executed, "Lane finished in {}ms", run.duration_ms);
        Ok(run)
    }

    /// lane의 핸들러 소유자 (실행 순서)
    pub fn lane_handlers(&self, lane: &str) -> Vec<String> {
        self.inner.pipeline.handlers(lane)
    }

    pub fn lanes(&self) -> &[String] {
        self.inner.pipeline.lanes()
    }

    // ========================================================================
    // 메뉴
    // ========================================================================

    /// 설치 순서대로 플러그인 메뉴를 이어붙임
    pub fn collect_menu(&self) -> Vec<MenuEntry> {
        self.inner
            .plugins
            .ordered()
            .into_iter()
            .filter_map(|(_, plugin)| plugin.context_menu())
            .flatten()
            .collect()
    }

    // ========================================================================
    // API
    // ========================================================================

    /// 플러그인 API 호출
    pub async fn invoke(&self, api: &str, args: Vec<Value>) -> Result<Value> {
        let method = self
            .inner
            .apis
            .read()
            .get(api)
            .map(|bound| Arc::clone(&bound.method))
            .ok_or_else(|| Error::ApiNotFound(api.to_string()))?;

        debug!(api = %api, "Invoking host api");
        method(args).await
    }

    pub fn has_api(&self, api: &str) -> bool {
        self.inner.apis.read().contains_key(api)
    }

    pub fn api_owner(&self, api: &str) -> Option<String> {
        self.inner.apis.read().get(api).map(|bound| bound.owner.clone())
    }

    /// 플러그인이 노출한 API 이름 (정렬)
    pub fn apis(&self) -> Vec<String> {
        let mut apis: Vec<String> = self.inner.apis.read().keys().cloned().collect();
        apis.sort();
        apis
    }

    // ========================================================================
    // 단축키
    // ========================================================================

    /// 키에 바인딩된 플러그인들에게 전달 - 호출된 콜백 수 반환
    pub fn dispatch_hotkey(&self, key: &str, event: &KeyEvent) -> usize {
        let key = key.to_lowercase();
        let callbacks: Vec<HotkeyCallback> = self
            .inner
            .hotkeys
            .read()
            .get(&key)
            .map(|bindings| {
                bindings
                    .iter()
                    .map(|binding| Arc::clone(&binding.callback))
                    .collect()
            })
            .unwrap_or_default();

        for callback in &callbacks {
            callback(&key, event);
        }
        callbacks.len()
    }

    /// 키 이름 -> 바인딩한 플러그인 (외부 키 캡처용 계약)
    pub fn hotkey_bindings(&self) -> Vec<(String, Vec<String>)> {
        self.inner
            .hotkeys
            .read()
            .iter()
            .map(|(key, bindings)| {
                (
                    key.clone(),
                    bindings.iter().map(|binding| binding.owner.clone()).collect(),
                )
            })
            .collect()
    }

    // ========================================================================
    // 단위
    // ========================================================================

    /// 전역 단위 변경
    ///
    /// 추적 중인 엔티티의 새 단위 기록을 canonical px에서 다시 계산하고 `unitChange`를 발행합니다.
    /// 새 단위 기록을 모두 계산한 뒤에만 단위를 바꾸므로, 실패하면 단위와 기록은 그대로입니다.
    pub async fn set_unit(&self, unit: Unit) -> Result<()> {
        let previous = self.inner.units.unit();
        if previous == unit {
            return Ok(());
        }

        let pending = self
            .inner
            .sync
            .prepare_resync(self.inner.surface.as_ref(), unit)?;
        self.inner.units.set_unit(unit);
        let synced = self.inner.sync.commit_resync(pending);
        info!(entities = synced, "Unit changed: {} -> {}", previous, unit);

        self.inner
            .events
            .publish(host_events::unit_change(previous, unit))
            .await;
        Ok(())
    }

    pub fn get_unit(&self) -> Unit {
        self.inner.units.unit()
    }

    pub async fn set_precision(&self, precision: u32) {
        if self.inner.units.precision() == precision {
            return;
        }
        self.inner.units.set_precision(precision);
        self.inner
            .events
            .publish(host_events::precision_change(precision))
            .await;
    }

    pub fn get_precision(&self) -> u32 {
        self.inner.units.precision()
    }

    // ========================================================================
    // 이벤트
    // ========================================================================

    /// 이벤트 발행 - 이벤트를 선언한 플러그인이 발행 주체
    pub async fn emit(&self, event: &str, data: Value) {
        let source = self
            .inner
            .registry
            .lock()
            .event_owner(event)
            .unwrap_or(HOST_OWNER)
            .to_string();

        self.inner
            .events
            .publish(plugin_events::emitted(&source, event, data))
            .await;
    }

    /// 리스너 등록
    pub async fn on(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        self.inner.events.subscribe(listener).await
    }

    pub async fn on_filtered(
        &self,
        listener: Arc<dyn EventListener>,
        filter: EventFilter,
    ) -> ListenerId {
        self.inner
            .events
            .subscribe_with_filter(listener, filter)
            .await
    }

    pub async fn off(&self, id: ListenerId) -> bool {
        self.inner.events.unsubscribe(id).await
    }

    // ========================================================================
    // 종료
    // ========================================================================

    /// 모든 플러그인을 설치 역순으로 제거하고 원장, lane, API, 단축키를 비움
    pub async fn destroy(&self) {
        for (name, plugin) in self.inner.plugins.drain_reversed() {
            self.detach(&name);
            if let Err(e) = plugin.destroy().await {
                warn!(plugin = %name, "Plugin destroy failed: {}", e);
            }
        }

        self.inner.pipeline.clear();
        self.inner.apis.write().clear();
        self.inner.hotkeys.write().clear();
        self.inner.registry.lock().clear();
        self.inner.sync.clear();

        let subscription = self.inner.subscription.lock().take();
        if let Some(id) = subscription {
            self.inner.surface.unsubscribe(id);
        }
        info!("Plugin host destroyed");
    }

    // ========================================================================
    // 접근자
    // ========================================================================

    pub fn config(&self) -> &HostConfig {
        &self.inner.config
    }

    pub fn surface(&self) -> &Arc<dyn DrawingSurface> {
        &self.inner.surface
    }

    pub fn converter(&self) -> &Arc<UnitConverter> {
        &self.inner.converter
    }

    pub fn unit_state(&self) -> &Arc<UnitState> {
        &self.inner.units
    }

    pub fn synchronizer(&self) -> &Arc<OriginSizeSynchronizer> {
        &self.inner.sync
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.inner.events
    }
}

fn bind_api(plugin: Arc<dyn Plugin>, api: String) -> ApiMethod {
    Arc::new(move |args| {
        let plugin = Arc::clone(&plugin);
        let api = api.clone();
        Box::pin(async move { plugin.call_api(&api, args).await })
    })
}

fn bind_hook(plugin: Arc<dyn Plugin>, lane: String) -> HookHandler {
    Arc::new(move |payload| {
        let plugin = Arc::clone(&plugin);
        let lane = lane.clone();
        Box::pin(async move { plugin.on_hook(&lane, payload).await })
    })
}
