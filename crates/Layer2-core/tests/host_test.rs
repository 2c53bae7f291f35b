//! 플러그인 호스트 통합 테스트
//!
//! 설치/제거, lane 실행, 메뉴 집계, 단위 전환, 연속 동기화를 호스트 경로로 검증

use async_trait::async_trait;
use easel_core::{
    fields, DrawingSurface, EntityId, Error, Geometry, KeyEvent, MemorySurface, MenuEntry, Plugin,
    PluginDescriptor, PluginHost, SignalKind,
};
use easel_foundation::{
    CapabilityKind, EditorEvent, EventFilter, EventListener, HostConfig, Rounding, Unit,
    UnitConverter, LANE_SAVE_BEFORE,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// 테스트 플러그인
// ============================================================================

type Journal = Arc<Mutex<Vec<String>>>;

/// lane 호출을 기록하는 플러그인
struct Recorder {
    name: String,
    journal: Journal,
    fail: bool,
    menu: Vec<&'static str>,
}

#[async_trait]
impl Plugin for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn hooks(&self) -> Vec<String> {
        vec![LANE_SAVE_BEFORE.to_string(), "hookNotALane".to_string()]
    }

    async fn on_hook(&self, lane: &str, payload: Value) -> easel_core::Result<Option<Value>> {
        tokio::task::yield_now().await;
        self.journal.lock().push(format!("{}:{}", self.name, lane));
        if self.fail {
            return Err(Error::Plugin(format!("{} refused", self.name)));
        }
        let mut payload = payload;
        if let Some(seen) = payload.get_mut("seen").and_then(Value::as_array_mut) {
            seen.push(json!(self.name));
        }
        Ok(Some(payload))
    }

    async fn call_api(&self, api: &str, _args: Vec<Value>) -> easel_core::Result<Value> {
        Ok(json!(format!("{}.{}", self.name, api)))
    }

    fn context_menu(&self) -> Option<Vec<MenuEntry>> {
        if self.menu.is_empty() {
            return None;
        }
        Some(
            self.menu
                .iter()
                .map(|label| MenuEntry::item(*label, || {}))
                .collect(),
        )
    }
}

fn recorder(name: &str, journal: &Journal) -> PluginDescriptor {
    recorder_with(name, journal, false, vec![])
}

fn recorder_with(
    name: &str,
    journal: &Journal,
    fail: bool,
    menu: Vec<&'static str>,
) -> PluginDescriptor {
    let journal = Arc::clone(journal);
    let owned = name.to_string();
    PluginDescriptor::new(name, move |_ctx| {
        Ok(Arc::new(Recorder {
            name: owned.clone(),
            journal: Arc::clone(&journal),
            fail,
            menu: menu.clone(),
        }) as Arc<dyn Plugin>)
    })
}

fn host() -> (PluginHost, Arc<MemorySurface>) {
    let surface = Arc::new(MemorySurface::with_workspace(800.0, 600.0));
    let host = PluginHost::builder()
        .surface(surface.clone())
        .fixed_dpi(96.0)
        .build()
        .unwrap();
    (host, surface)
}

// ============================================================================
// 설치 / 이름 공간
// ============================================================================

#[tokio::test]
async fn test_duplicate_and_conflict_leave_registry_unchanged() {
    let (host, _surface) = host();
    let journal = Journal::default();

    host.install(
        recorder("A", &journal).with_events(["changed"]).with_apis(["alpha"]),
        json!({}),
    )
    .await
    .unwrap();

    let err = host.install(recorder("A", &journal), json!({})).await.unwrap_err();
    assert!(matches!(err, Error::DuplicatePlugin { ref plugin } if plugin == "A"));

    let err = host
        .install(
            recorder("B", &journal).with_apis(["beta", "alpha"]),
            json!({}),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CapabilityConflict { kind: CapabilityKind::Api, ref name, ref owner, .. }
            if name == "alpha" && owner == "A"
    ));

    let err = host
        .install(recorder("B", &journal).with_events(["changed"]), json!({}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CapabilityConflict { kind: CapabilityKind::Event, .. }
    ));

    assert_eq!(host.plugin_names(), vec!["A"]);
    assert_eq!(host.apis(), vec!["alpha"]);

    // "beta"는 점유되지 않았으므로 다른 플러그인이 가져갈 수 있음
    host.install(recorder("C", &journal).with_apis(["beta"]), json!({}))
        .await
        .unwrap();
    assert_eq!(host.apis(), vec!["alpha", "beta"]);
    assert_eq!(host.invoke("beta", vec![]).await.unwrap(), json!("C.beta"));
}

#[tokio::test]
async fn test_failing_constructor_leaves_no_trace() {
    let (host, _surface) = host();

    let broken = PluginDescriptor::new("Broken", |_ctx| Err(Error::Plugin("boom".into())))
        .with_apis(["fix"]);
    assert!(host.install(broken, json!({})).await.is_err());

    assert!(host.plugin_names().is_empty());
    assert!(!host.has_api("fix"));

    let journal = Journal::default();
    host.install(recorder("Broken", &journal).with_apis(["fix"]), json!({}))
        .await
        .unwrap();
    assert_eq!(host.api_owner("fix").as_deref(), Some("Broken"));
}

#[tokio::test]
async fn test_uninstall_clears_apis_and_lanes() {
    let (host, _surface) = host();
    let journal = Journal::default();

    host.install(
        recorder("A", &journal)
            .with_apis(["alpha"])
            .with_hotkeys(["Delete"]),
        json!({}),
    )
    .await
    .unwrap();
    assert_eq!(host.dispatch_hotkey("delete", &KeyEvent::down("delete")), 1);
    assert_eq!(
        host.hotkey_bindings(),
        vec![("delete".to_string(), vec!["A".to_string()])]
    );
    // 인식하지 않는 lane은 무시
    assert_eq!(host.plugin_infos()[0].hooks, vec![LANE_SAVE_BEFORE]);
    assert_eq!(host.lane_handlers(LANE_SAVE_BEFORE), vec!["A"]);

    assert!(host.uninstall("A").await.unwrap());
    assert!(!host.has_api("alpha"));
    assert!(matches!(
        host.invoke("alpha", vec![]).await,
        Err(Error::ApiNotFound(_))
    ));
    assert!(host.lane_handlers(LANE_SAVE_BEFORE).is_empty());
    assert!(host.get_plugin("A").is_none());
    assert_eq!(host.dispatch_hotkey("delete", &KeyEvent::down("delete")), 0);
    assert!(host.hotkey_bindings().is_empty());

    // 다시 설치 가능
    host.install(recorder("A", &journal).with_apis(["alpha"]), json!({}))
        .await
        .unwrap();
    assert!(host.get_plugin("A").is_some());
}

#[tokio::test]
async fn test_plugin_named_host_cannot_free_reserved_methods() {
    let (host, _surface) = host();
    let journal = Journal::default();

    let err = host.install(recorder("host", &journal), json!({})).await.unwrap_err();
    assert!(matches!(err, Error::DuplicatePlugin { ref plugin } if plugin == "host"));
    assert!(!host.uninstall("host").await.unwrap());

    let err = host
        .install(recorder("Evil", &journal).with_apis(["setUnit"]), json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CapabilityConflict { ref owner, .. } if owner == "host"));
    assert!(host.plugin_names().is_empty());
}

// ============================================================================
// Lifecycle lane
// ============================================================================

#[tokio::test]
async fn test_lane_runs_in_install_order_and_replaces_payload() {
    let (host, _surface) = host();
    let journal = Journal::default();

    for name in ["first", "second", "third"] {
        host.install(recorder(name, &journal), json!({})).await.unwrap();
    }

    let payload = host
        .run(LANE_SAVE_BEFORE, json!({ "seen": [] }))
        .await
        .unwrap();
    assert_eq!(payload, json!({ "seen": ["first", "second", "third"] }));
}

#[tokio::test]
async fn test_second_handler_failure_stops_the_lane() {
    let (host, _surface) = host();
    let journal = Journal::default();

    host.install(recorder("first", &journal), json!({})).await.unwrap();
    host.install(recorder_with("second", &journal, true, vec![]), json!({}))
        .await
        .unwrap();
    host.install(recorder("third", &journal), json!({})).await.unwrap();

    let err = host.run(LANE_SAVE_BEFORE, json!({})).await.unwrap_err();
    match &err {
        Error::HookExecution { lane, owner, .. } => {
            assert_eq!(lane, LANE_SAVE_BEFORE);
            assert_eq!(owner, "second");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(err.hook_cause(), Some(Error::Plugin(_))));

    assert_eq!(
        *journal.lock(),
        vec![
            format!("first:{}", LANE_SAVE_BEFORE),
            format!("second:{}", LANE_SAVE_BEFORE),
        ]
    );
}

#[tokio::test]
async fn test_unknown_lane_is_rejected() {
    let (host, _surface) = host();
    assert!(matches!(
        host.run("hookNotALane", json!({})).await,
        Err(Error::UnknownLane(_))
    ));
}

/// 해제 신호를 받을 때까지 lane을 붙잡는 플러그인
struct Gate {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl Plugin for Gate {
    fn name(&self) -> &str {
        "Gate"
    }

    fn hooks(&self) -> Vec<String> {
        vec![LANE_SAVE_BEFORE.to_string()]
    }

    async fn on_hook(&self, _lane: &str, _payload: Value) -> easel_core::Result<Option<Value>> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(None)
    }
}

#[tokio::test]
async fn test_install_rejected_while_lane_in_flight() {
    let (host, _surface) = host();
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let gate = {
        let started = Arc::clone(&started);
        let release = Arc::clone(&release);
        PluginDescriptor::new("Gate", move |_ctx| {
            Ok(Arc::new(Gate {
                started: Arc::clone(&started),
                release: Arc::clone(&release),
            }) as Arc<dyn Plugin>)
        })
    };
    host.install(gate, json!({})).await.unwrap();

    let running = host.clone();
    let run = tokio::spawn(async move { running.run(LANE_SAVE_BEFORE, json!({})).await });
    started.notified().await;

    let journal = Journal::default();
    assert!(matches!(
        host.install(recorder("Late", &journal), json!({})).await,
        Err(Error::HostBusy(_))
    ));
    assert!(matches!(host.uninstall("Gate").await, Err(Error::HostBusy(_))));

    release.notify_one();
    run.await.unwrap().unwrap();

    host.install(recorder("Late", &journal), json!({})).await.unwrap();
    assert!(host.uninstall("Gate").await.unwrap());
}

// ============================================================================
// 메뉴
// ============================================================================

#[tokio::test]
async fn test_collect_menu_concatenates_in_install_order() {
    let (host, _surface) = host();
    let journal = Journal::default();

    host.install(recorder_with("one", &journal, false, vec!["Copy", "Paste"]), json!({}))
        .await
        .unwrap();
    host.install(recorder("silent", &journal), json!({})).await.unwrap();
    host.install(recorder_with("three", &journal, false, vec!["Lock"]), json!({}))
        .await
        .unwrap();

    let menu = host.collect_menu();
    let labels: Vec<&str> = menu.iter().filter_map(MenuEntry::label).collect();
    assert_eq!(labels, vec!["Copy", "Paste", "Lock"]);
}

// ============================================================================
// 단위 / 동기화
// ============================================================================

#[test]
fn test_default_rounding_is_ceiling() {
    let converter = UnitConverter::new(96.0);
    let exact = 10.0 * 96.0 / 25.4;
    let px = converter.mm_to_px(10.0, None, Rounding::default()).unwrap();

    assert_eq!(px, px.trunc());
    assert!(px >= exact && px < exact + 1.0);
}

#[test]
fn test_direct_round_trip() {
    let converter = UnitConverter::new(96.0);
    for dpi in [72.0, 96.0, 150.0, 300.0] {
        for mm in [0.0, 0.1, 25.4, 210.0, 1234.5] {
            let px = converter.mm_to_px(mm, Some(dpi), Rounding::Direct).unwrap();
            let back = converter.px_to_mm(px, Some(dpi)).unwrap();
            assert!((back - mm).abs() < 1e-9, "{} mm @ {} dpi -> {}", mm, dpi, back);
        }
    }
}

#[tokio::test]
async fn test_unit_switch_leaves_canonical_geometry_unchanged() {
    let (host, surface) = host();
    let id: EntityId = "r".into();
    surface.add_with_id(
        id.clone(),
        "rect",
        Geometry::new()
            .with(fields::LEFT, 13.0)
            .with(fields::WIDTH, 101.0)
            .with(fields::FONT_SIZE, 17.0),
    );
    let before = surface.geometry(&id).unwrap();

    let mut events = host.events().receiver();
    host.set_unit(Unit::Millimeter).await.unwrap();
    let mm = host.synchronizer().snapshot(&id, Unit::Millimeter).unwrap();
    assert!((mm.number(fields::WIDTH).unwrap() - 101.0 * 25.4 / 96.0).abs() < 1e-9);

    host.set_unit(Unit::Pixel).await.unwrap();
    assert_eq!(surface.geometry(&id).unwrap(), before);
    assert_eq!(host.get_unit(), Unit::Pixel);

    let first = events.try_recv().unwrap();
    assert_eq!(first.name, "unitChange");
    assert_eq!(first.data, json!({ "previous": "px", "unit": "mm" }));
}

#[tokio::test]
async fn test_unit_switch_resyncs_every_entity_around_odd_fields() {
    let (host, surface) = host();
    surface.add_with_id(
        "a".into(),
        "text",
        Geometry::new().with_value(fields::WIDTH, json!("auto")),
    );
    surface.add_with_id("b".into(), "rect", Geometry::new().with(fields::WIDTH, 96.0));

    let mut events = host.events().receiver();
    host.set_unit(Unit::Millimeter).await.unwrap();

    assert_eq!(host.get_unit(), Unit::Millimeter);
    let a = host.synchronizer().snapshot(&"a".into(), Unit::Millimeter).unwrap();
    assert_eq!(a.values.get(fields::WIDTH), Some(&json!("auto")));
    let b = host.synchronizer().snapshot(&"b".into(), Unit::Millimeter).unwrap();
    assert!((b.number(fields::WIDTH).unwrap() - 25.4).abs() < 1e-9);
    assert_eq!(events.try_recv().unwrap().name, "unitChange");
}

#[tokio::test]
async fn test_failed_unit_switch_changes_nothing() {
    let surface = Arc::new(MemorySurface::new());
    let host = PluginHost::builder()
        .surface(surface.clone())
        .fixed_dpi(1e-300)
        .build()
        .unwrap();
    surface.add_with_id("small".into(), "rect", Geometry::new().with(fields::WIDTH, 1.0));
    // 이 DPI에서 mm 값이 f64 범위를 넘음
    surface.add_with_id("huge".into(), "rect", Geometry::new().with(fields::WIDTH, 1e10));
    let mut units = host.unit_state().subscribe();

    let mut events = host.events().receiver();
    let err = host.set_unit(Unit::Millimeter).await.unwrap_err();

    assert!(matches!(err, Error::InvalidMeasurement { .. }));
    assert_eq!(host.get_unit(), Unit::Pixel);
    assert!(!units.has_changed().unwrap());
    assert!(host
        .synchronizer()
        .snapshot(&"small".into(), Unit::Millimeter)
        .is_none());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_apply_in_unit_rejects_infinity_without_touching_geometry() {
    let (host, surface) = host();
    host.install(easel_core::builtin::unit::descriptor(), json!({}))
        .await
        .unwrap();
    surface.add_with_id("r".into(), "rect", Geometry::new().with(fields::WIDTH, 96.0));

    let err = host
        .invoke(
            "applyObjectByUnit",
            vec![json!("r"), json!({ "width": "inf" }), json!("mm")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidMeasurement { .. }));
    assert_eq!(
        surface.geometry(&"r".into()).unwrap().number(fields::WIDTH),
        Some(96.0)
    );
}

#[tokio::test(start_paused = true)]
async fn test_continuous_gesture_is_throttled_then_settled_exactly() {
    let surface = Arc::new(MemorySurface::new());
    let host = PluginHost::builder()
        .config(HostConfig::default().with_sync_interval_ms(30))
        .surface(surface.clone())
        .fixed_dpi(96.0)
        .build()
        .unwrap();
    host.set_unit(Unit::Millimeter).await.unwrap();

    let id: EntityId = "dragged".into();
    surface.add_with_id(id.clone(), "rect", Geometry::new().with(fields::LEFT, 0.0));

    for step in 1..=100 {
        tokio::time::advance(Duration::from_millis(2)).await;
        let patch = Geometry::new().with(fields::LEFT, step as f64 * 1.5);
        surface
            .set_geometry(&id, &patch, SignalKind::Continuous)
            .unwrap();
    }

    let stats = host.synchronizer().stats();
    assert!(stats.continuous < 100);
    assert!(stats.dropped > 0);

    surface.signal(&id, SignalKind::Settle).unwrap();
    let record = host.synchronizer().snapshot(&id, Unit::Millimeter).unwrap();
    let expected = host.converter().px_to_mm(150.0, Some(96.0)).unwrap();
    assert_eq!(record.number(fields::LEFT), Some(expected));
}

// ============================================================================
// 이벤트 / 종료
// ============================================================================

#[tokio::test]
async fn test_emit_attributes_declared_events() {
    let (host, _surface) = host();
    let journal = Journal::default();
    host.install(recorder("A", &journal).with_events(["alphaChanged"]), json!({}))
        .await
        .unwrap();

    let mut events = host.events().receiver();
    host.emit("alphaChanged", json!(1)).await;
    host.emit("undeclared", json!(2)).await;

    assert_eq!(events.try_recv().unwrap().source, "A");
    assert_eq!(events.try_recv().unwrap().source, "host");
}

#[tokio::test]
async fn test_filtered_listener_sees_only_its_plugin() {
    #[derive(Default)]
    struct Names(Mutex<Vec<String>>);

    #[async_trait]
    impl EventListener for Names {
        fn name(&self) -> &str {
            "names"
        }

        async fn on_event(&self, event: &EditorEvent) {
            self.0.lock().push(event.name.clone());
        }
    }

    let (host, _surface) = host();
    let journal = Journal::default();
    let listener = Arc::new(Names::default());
    let id = host
        .on_filtered(listener.clone(), EventFilter::from_plugin("A"))
        .await;

    host.install(recorder("A", &journal).with_events(["alphaChanged"]), json!({}))
        .await
        .unwrap();
    host.install(recorder("B", &journal).with_events(["betaChanged"]), json!({}))
        .await
        .unwrap();
    host.emit("alphaChanged", json!(1)).await;
    host.emit("betaChanged", json!(2)).await;
    host.set_unit(Unit::Millimeter).await.unwrap();

    assert_eq!(*listener.0.lock(), vec!["alphaChanged"]);

    let lifecycle = host
        .events()
        .history_matching(&EventFilter::from_host(), None)
        .await;
    let names: Vec<&str> = lifecycle.iter().map(|event| event.name.as_str()).collect();
    assert_eq!(names, vec!["unitChange", "pluginInstalled", "pluginInstalled"]);

    assert!(host.off(id).await);
    host.emit("alphaChanged", json!(3)).await;
    assert_eq!(listener.0.lock().len(), 1);
}

#[tokio::test]
async fn test_destroy_tears_everything_down() {
    let (host, surface) = host();
    let journal = Journal::default();
    host.install(recorder("A", &journal).with_apis(["alpha"]), json!({}))
        .await
        .unwrap();
    host.install(recorder("B", &journal), json!({})).await.unwrap();

    host.destroy().await;

    assert!(host.plugin_names().is_empty());
    assert!(host.apis().is_empty());
    assert!(host.lane_handlers(LANE_SAVE_BEFORE).is_empty());

    // 신호 구독도 해제됨
    let id = surface.add("rect", Geometry::new().with(fields::LEFT, 1.0));
    assert!(host.synchronizer().origin_size(&id).is_none());

    // 원장이 비워졌으므로 같은 이름으로 다시 설치 가능
    host.install(recorder("A", &journal).with_apis(["alpha"]), json!({}))
        .await
        .unwrap();
}
