//! Event Bus - 호스트 이벤트 계층
//!
//! 호스트 이벤트(단위 변경, 플러그인 설치/제거)와 플러그인이 선언한 이벤트를
//! 발행 주체(attribution)와 함께 리스너, broadcast 수신자, 히스토리로 전달합니다.

use super::types::EditorEvent;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, trace};

/// broadcast 채널 용량
const CHANNEL_CAPACITY: usize = 1024;

/// 히스토리에 보관하는 최근 이벤트 수
pub const HISTORY_LIMIT: usize = 100;

// ============================================================================
// EventListener Trait
// ============================================================================

/// 이벤트 리스너 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// 이벤트 리스너 trait
#[async_trait]
pub trait EventListener: Send + Sync {
    /// 리스너 이름 (로그용)
    fn name(&self) -> &str;

    async fn on_event(&self, event: &EditorEvent);
}

// ============================================================================
// EventOrigin / EventFilter
// ============================================================================

/// 이벤트 발행 주체
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOrigin {
    /// 호스트 자신 (선언되지 않은 이름의 `emit` 포함)
    Host,
    /// 아무 플러그인
    AnyPlugin,
    /// 이벤트를 선언한 특정 플러그인
    Plugin(String),
}

impl EventOrigin {
    pub fn matches(&self, event: &EditorEvent) -> bool {
        match self {
            Self::Host => event.is_from_host(),
            Self::AnyPlugin => !event.is_from_host(),
            Self::Plugin(name) => event.source == *name,
        }
    }
}

/// 이벤트 필터
///
/// 이름은 정확히 일치해야 합니다. 플러그인 이벤트 이름은 선언 단위로
/// 소유되므로 접두사 매칭은 다른 플러그인의 이벤트까지 잡게 됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    names: Option<BTreeSet<String>>,
    origin: Option<EventOrigin>,
}

impl EventFilter {
    /// 모든 이벤트를 통과시키는 필터
    pub fn new() -> Self {
        Self::default()
    }

    /// 지정한 이름의 이벤트만
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().with_names(names)
    }

    /// 호스트가 발행한 이벤트만
    pub fn from_host() -> Self {
        Self::new().with_origin(EventOrigin::Host)
    }

    /// 플러그인이 발행한 이벤트만
    pub fn from_plugins() -> Self {
        Self::new().with_origin(EventOrigin::AnyPlugin)
    }

    /// 특정 플러그인이 발행한 이벤트만
    pub fn from_plugin(plugin: impl Into<String>) -> Self {
        Self::new().with_origin(EventOrigin::Plugin(plugin.into()))
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names
            .get_or_insert_with(BTreeSet::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_origin(mut self, origin: EventOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn origin(&self) -> Option<&EventOrigin> {
        self.origin.as_ref()
    }

    pub fn matches(&self, event: &EditorEvent) -> bool {
        let name_ok = self
            .names
            .as_ref()
            .map_or(true, |names| names.contains(&event.name));
        let origin_ok = self
            .origin
            .as_ref()
            .map_or(true, |origin| origin.matches(event));
        name_ok && origin_ok
    }
}

// ============================================================================
// EventBus
// ============================================================================

struct RegisteredListener {
    listener: Arc<dyn EventListener>,
    filter: EventFilter,
}

/// 이벤트 버스
///
/// 호스트의 `emit`/`on`/`off` 표면 뒤에 있는 구현입니다. 리스너는 등록
/// 순서대로 호출되고, 호출 중에는 락을 잡고 있지 않아 리스너 안에서 다시
/// 발행할 수 있습니다.
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
    listeners: RwLock<BTreeMap<ListenerId, RegisteredListener>>,
    next_listener: AtomicU64,
    history: RwLock<VecDeque<EditorEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            sender,
            listeners: RwLock::new(BTreeMap::new()),
            next_listener: AtomicU64::new(0),
            history: RwLock::new(VecDeque::with_capacity(HISTORY_LIMIT)),
        }
    }

    /// 모든 이벤트를 받는 리스너 등록
    pub async fn subscribe(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        self.subscribe_with_filter(listener, EventFilter::new()).await
    }

    pub async fn subscribe_with_filter(
        &self,
        listener: Arc<dyn EventListener>,
        filter: EventFilter,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));

        debug!(
            listener = listener.name(),
            listener_id = %id,
            origin = ?filter.origin(),
            "Registering event listener"
        );

        self.listeners
            .write()
            .await
            .insert(id, RegisteredListener { listener, filter });
        id
    }

    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = self.listeners.write().await.remove(&id).is_some();
        if removed {
            debug!(listener_id = %id, "Unregistered event listener");
        }
        removed
    }

    /// 이벤트 발행
    pub async fn publish(&self, event: EditorEvent) {
        trace!(
            event_id = %event.id,
            event = %event.name,
            source = %event.source,
            "Publishing event"
        );

        {
            let mut history = self.history.write().await;
            if history.len() == HISTORY_LIMIT {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        // 수신자가 없으면 Err - 무시
        let _ = self.sender.send(event.clone());

        // 전달 대상만 복사한 뒤 락 없이 호출
        let targets: Vec<Arc<dyn EventListener>> = {
            let listeners = self.listeners.read().await;
            listeners
                .values()
                .filter(|registered| registered.filter.matches(&event))
                .map(|registered| Arc::clone(&registered.listener))
                .collect()
        };

        for listener in targets {
            trace!(listener = listener.name(), event = %event.name, "Delivering event");
            listener.on_event(&event).await;
        }
    }

    /// broadcast 수신자 생성 (스트림 방식)
    pub fn receiver(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }

    /// 최근 이벤트 (최신순)
    pub async fn history(&self, limit: Option<usize>) -> Vec<EditorEvent> {
        self.history_matching(&EventFilter::new(), limit).await
    }

    /// 필터를 통과한 최근 이벤트 (최신순)
    pub async fn history_matching(
        &self,
        filter: &EventFilter,
        limit: Option<usize>,
    ) -> Vec<EditorEvent> {
        let history = self.history.read().await;
        history
            .iter()
            .rev()
            .filter(|event| filter.matches(event))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types::{host, plugin};
    use crate::units::Unit;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Weak;

    /// 받은 이벤트 이름을 기록하는 리스너
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<String> {
            self.seen.lock().clone()
        }
    }

    #[async_trait]
    impl EventListener for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn on_event(&self, event: &EditorEvent) {
            self.seen.lock().push(event.name.clone());
        }
    }

    #[tokio::test]
    async fn test_filters_route_by_attribution() {
        let bus = EventBus::new();
        let from_host = Arc::new(Recorder::default());
        let from_ruler = Arc::new(Recorder::default());
        let everything = Arc::new(Recorder::default());

        bus.subscribe_with_filter(from_host.clone(), EventFilter::from_host())
            .await;
        bus.subscribe_with_filter(from_ruler.clone(), EventFilter::from_plugin("Ruler"))
            .await;
        bus.subscribe(everything.clone()).await;

        bus.publish(host::unit_change(Unit::Pixel, Unit::Millimeter))
            .await;
        bus.publish(plugin::emitted("Ruler", "rulerEnabled", json!(true)))
            .await;
        bus.publish(plugin::emitted("Grid", "gridEnabled", json!(true)))
            .await;
        // 선언되지 않은 이름은 호스트 명의로 발행됨
        bus.publish(plugin::emitted(host::SOURCE, "undeclared", json!(null)))
            .await;

        assert_eq!(from_host.seen(), vec!["unitChange", "undeclared"]);
        assert_eq!(from_ruler.seen(), vec!["rulerEnabled"]);
        assert_eq!(everything.seen().len(), 4);
    }

    #[test]
    fn test_names_match_exactly() {
        let filter = EventFilter::named(["ruler"]);
        let declared = plugin::emitted("Ruler", "rulerEnabled", json!(true));
        assert!(!filter.matches(&declared));

        let filter = EventFilter::from_plugins().with_names(["rulerEnabled"]);
        assert!(filter.matches(&declared));
        assert!(!filter.matches(&plugin::emitted(host::SOURCE, "rulerEnabled", json!(1))));
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_queryable_by_origin() {
        let bus = EventBus::new();
        bus.publish(host::plugin_installed("Ruler")).await;
        for i in 0..HISTORY_LIMIT {
            bus.publish(plugin::emitted("Ruler", &format!("tick{}", i), json!(i)))
                .await;
        }

        let all = bus.history(None).await;
        assert_eq!(all.len(), HISTORY_LIMIT);
        assert_eq!(all[0].name, format!("tick{}", HISTORY_LIMIT - 1));
        // 가장 오래된 호스트 이벤트는 밀려남
        assert!(bus
            .history_matching(&EventFilter::from_host(), None)
            .await
            .is_empty());

        let recent = bus
            .history_matching(&EventFilter::from_plugin("Ruler"), Some(2))
            .await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].name, format!("tick{}", HISTORY_LIMIT - 2));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery_but_not_receivers() {
        let bus = EventBus::new();
        let listener = Arc::new(Recorder::default());
        let id = bus.subscribe(listener.clone()).await;
        let mut rx = bus.receiver();

        assert!(bus.unsubscribe(id).await);
        assert!(!bus.unsubscribe(id).await);
        assert_eq!(bus.listener_count().await, 0);

        bus.publish(host::precision_change(3)).await;
        assert!(listener.seen().is_empty());
        assert_eq!(rx.recv().await.unwrap().name, "precisionChange");
    }

    #[tokio::test]
    async fn test_listener_may_publish_while_handling() {
        /// unitChange를 받으면 자기 이벤트를 다시 발행하는 리스너
        struct Relay {
            bus: Weak<EventBus>,
        }

        #[async_trait]
        impl EventListener for Relay {
            fn name(&self) -> &str {
                "relay"
            }

            async fn on_event(&self, event: &EditorEvent) {
                if let Some(bus) = self.bus.upgrade() {
                    bus.publish(plugin::emitted("Ruler", "rulerRedraw", event.data.clone()))
                        .await;
                }
            }
        }

        let bus = Arc::new(EventBus::new());
        let relay = Arc::new(Relay {
            bus: Arc::downgrade(&bus),
        });
        bus.subscribe_with_filter(relay, EventFilter::named(["unitChange"]))
            .await;

        bus.publish(host::unit_change(Unit::Pixel, Unit::Inch)).await;

        let names: Vec<String> = bus
            .history(None)
            .await
            .into_iter()
            .map(|event| event.name)
            .collect();
        assert_eq!(names, vec!["rulerRedraw", "unitChange"]);
    }
}
