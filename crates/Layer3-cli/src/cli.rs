//! Non-interactive commands

use async_trait::async_trait;
use easel_core::{
    builtin, fields, DrawingSurface, EntityId, Geometry, MemorySurface, PluginHost, SignalKind,
};
use easel_foundation::{
    round_to, EditorEvent, EventListener, HostConfig, JsonStore, Measure, Rounding, Unit,
    UnitConverter, HOST_CONFIG_FILE, LANE_SAVE_AFTER, LANE_SAVE_BEFORE,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// ============================================================================
// convert
// ============================================================================

/// 길이 변환
pub fn convert(
    config: &HostConfig,
    value: &str,
    from: Unit,
    to: Unit,
    dpi: Option<f64>,
    direct: bool,
    precision: Option<u32>,
) -> anyhow::Result<()> {
    let converter = UnitConverter::new(config.default_dpi);
    let result = convert_value(&converter, Measure::Text(value), from, to, dpi, direct)?;
    let result = match precision {
        Some(digits) => round_to(result, digits),
        None => result,
    };

    println!("{} {} = {} {}", value.trim(), from.label(), result, to.label());
    Ok(())
}

/// px 출력만 올림 (`direct`면 반올림 없음)
fn convert_value(
    converter: &UnitConverter,
    value: Measure<'_>,
    from: Unit,
    to: Unit,
    dpi: Option<f64>,
    direct: bool,
) -> easel_foundation::Result<f64> {
    if from == to {
        return value.normalize(from.as_str());
    }

    let rounding = if direct {
        Rounding::Direct
    } else {
        Rounding::Ceil
    };

    if to.is_pixel() {
        return converter.unit_to_px(value, from, dpi, rounding);
    }
    let px = converter.unit_to_px(value, from, dpi, Rounding::Direct)?;
    converter.px_to_unit(px, to, dpi)
}

// ============================================================================
// plugins
// ============================================================================

/// 기본 플러그인 설치 후 기여 목록 출력
pub async fn plugins(config: HostConfig, as_json: bool) -> anyhow::Result<()> {
    let host = PluginHost::builder().config(config).build()?;
    builtin::install_all(&host).await?;

    let infos = host.plugin_infos();
    if as_json {
        let output = json!({
            "plugins": infos,
            "lanes": host.lanes(),
            "hotkeys": host.hotkey_bindings(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Lanes: {}", host.lanes().join(", "));
    println!();
    for info in &infos {
        println!("#{} {}", info.load_order, info.name);
        if !info.apis.is_empty() {
            println!("   apis:    {}", info.apis.join(", "));
        }
        if !info.events.is_empty() {
            println!("   events:  {}", info.events.join(", "));
        }
        if !info.hotkeys.is_empty() {
            println!("   hotkeys: {}", info.hotkeys.join(", "));
        }
        if !info.hooks.is_empty() {
            println!("   hooks:   {}", info.hooks.join(", "));
        }
    }

    host.destroy().await;
    Ok(())
}

// ============================================================================
// init
// ============================================================================

/// 현재 적용된 설정을 파일로 저장
pub fn init(config: &HostConfig, global: bool) -> anyhow::Result<()> {
    let store = if global {
        config.save_global()?;
        JsonStore::global()?
    } else {
        config.save_project()?;
        JsonStore::current_project()?
    };
    println!("Wrote {}", store.file_path(HOST_CONFIG_FILE).display());
    Ok(())
}

// ============================================================================
// demo
// ============================================================================

/// 이벤트를 출력하는 리스너
struct PrintListener;

#[async_trait]
impl EventListener for PrintListener {
    fn name(&self) -> &str {
        "demo-printer"
    }

    async fn on_event(&self, event: &EditorEvent) {
        println!("  [event] {} from {} {}", event.name, event.source, event.data);
    }
}

/// 스크립트 세션: 도형 생성, 드래그, origin-size 출력, 저장 lane 실행
pub async fn demo(config: HostConfig, unit: Unit) -> anyhow::Result<()> {
    let interval = Duration::from_millis(config.continuous_sync_interval_ms);
    let surface = Arc::new(MemorySurface::with_workspace(800.0, 600.0));
    let host = PluginHost::builder()
        .config(config)
        .surface(surface.clone())
        .build()?;

    host.on(Arc::new(PrintListener)).await;
    builtin::install_all(&host).await?;
    host.set_unit(unit).await?;
    info!(unit = %unit, "Demo session started");

    // 1. 현재 단위로 사각형 생성
    println!("== create ==");
    let created = host
        .invoke(
            "createRect",
            vec![json!({ "left": 10, "top": 10, "width": 40, "height": 20, "fill": "#3b82f6" })],
        )
        .await?;
    let id = EntityId::named(created.as_str().unwrap_or_default());
    print_entity(&host, surface.as_ref(), &id, unit);

    // 2. 드래그 (continuous 신호 후 settle)
    println!("== drag ==");
    let start = surface.geometry(&id).and_then(|g| g.number(fields::LEFT)).unwrap_or(0.0);
    for step in 1..=40 {
        let patch = Geometry::new().with(fields::LEFT, start + step as f64 * 2.5);
        surface.set_geometry(&id, &patch, SignalKind::Continuous)?;
        tokio::time::sleep(interval / 8).await;
    }
    surface.signal(&id, SignalKind::Settle)?;
    let stats = host.synchronizer().stats();
    println!(
        "  sync: {} settle, {} continuous, {} dropped",
        stats.settle, stats.continuous, stats.dropped
    );
    print_entity(&host, surface.as_ref(), &id, unit);

    // 3. 정렬, 1px 이동
    println!("== align ==");
    host.invoke("center", vec![json!(id)]).await?;
    host.dispatch_hotkey("right", &easel_core::KeyEvent::down("right"));
    print_entity(&host, surface.as_ref(), &id, unit);

    // 4. 저장 lane
    println!("== save ==");
    let before = host.run_traced(LANE_SAVE_BEFORE, json!({})).await?;
    println!("  {} ran: {}", before.lane, before.executed.join(", "));
    let after = host.run_traced(LANE_SAVE_AFTER, json!({})).await?;
    println!("  {} ran: {}", after.lane, after.executed.join(", "));

    // 5. 메뉴
    println!("== menu ==");
    for entry in host.collect_menu() {
        match entry.label() {
            Some(label) => println!("  {}", label),
            None => println!("  ---"),
        }
    }

    let recorded = host.events().history(None).await;
    println!("== {} events recorded ==", recorded.len());

    host.destroy().await;
    Ok(())
}

fn print_entity(host: &PluginHost, surface: &dyn DrawingSurface, id: &EntityId, unit: Unit) {
    if let Some(geometry) = surface.geometry(id) {
        println!("  px:   {}", json!(geometry));
    }
    if let Some(record) = host.synchronizer().display_snapshot(id, unit, None) {
        println!("  {}: {}", unit.label(), record);
    }
}
