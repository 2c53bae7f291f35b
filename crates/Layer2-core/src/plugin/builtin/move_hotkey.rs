//! MoveHotKeyPlugin - 방향키로 활성 엔티티를 1px씩 이동

use crate::plugin::{KeyEvent, Plugin, PluginContext, PluginDescriptor};
use crate::surface::{fields, DrawingSurface, Geometry, SignalKind};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub const NAME: &str = "MoveHotKeyPlugin";

/// 한 번 누를 때 이동량 (px)
const STEP: f64 = 1.0;

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(NAME, |ctx| Ok(Arc::new(MoveHotKeyPlugin::new(ctx)) as Arc<dyn Plugin>))
        .with_hotkeys(["left", "right", "up", "down"])
}

pub struct MoveHotKeyPlugin {
    surface: Arc<dyn DrawingSurface>,
}

impl MoveHotKeyPlugin {
    pub fn new(ctx: PluginContext) -> Self {
        Self {
            surface: ctx.surface,
        }
    }

    fn delta(key: &str) -> Option<(&'static str, f64)> {
        match key {
            "left" => Some((fields::LEFT, -STEP)),
            "right" => Some((fields::LEFT, STEP)),
            "up" => Some((fields::TOP, -STEP)),
            "down" => Some((fields::TOP, STEP)),
            _ => None,
        }
    }
}

#[async_trait]
impl Plugin for MoveHotKeyPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn on_hotkey(&self, key: &str, event: &KeyEvent) {
        if !event.is_down() {
            return;
        }
        let Some((field, delta)) = Self::delta(key) else {
            return;
        };
        let Some(active) = self.surface.active() else {
            return;
        };
        // 위치가 없는 엔티티는 이동하지 않음
        let Some(current) = self.surface.geometry(&active).and_then(|g| g.number(field)) else {
            return;
        };

        let patch = Geometry::new().with(field, current + delta);
        if let Err(e) = self.surface.set_geometry(&active, &patch, SignalKind::Settle) {
            warn!(entity = %active, "Nudge failed: {}", e);
        }
    }
}
