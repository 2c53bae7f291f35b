//! DeleteHotKeyPlugin - 활성 엔티티 삭제 (API, backspace, 메뉴)

use crate::plugin::{KeyEvent, MenuEntry, MenuItem, Plugin, PluginContext, PluginDescriptor};
use crate::surface::DrawingSurface;
use async_trait::async_trait;
use easel_foundation::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub const NAME: &str = "DeleteHotKeyPlugin";

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(NAME, |ctx| Ok(Arc::new(DeleteHotKeyPlugin::new(ctx)) as Arc<dyn Plugin>))
        .with_apis(["del"])
        .with_hotkeys(["backspace"])
}

pub struct DeleteHotKeyPlugin {
    surface: Arc<dyn DrawingSurface>,
}

impl DeleteHotKeyPlugin {
    pub fn new(ctx: PluginContext) -> Self {
        Self {
            surface: ctx.surface,
        }
    }

    /// 활성 엔티티 삭제 - 삭제 여부 반환
    pub fn delete_active(&self) -> Result<bool> {
        delete_active(self.surface.as_ref())
    }
}

fn delete_active(surface: &dyn DrawingSurface) -> Result<bool> {
    let Some(active) = surface.active() else {
        return Ok(false);
    };
    surface.remove(&active)?;
    surface.set_active(None);
    debug!(entity = %active, "Deleted active entity");
    Ok(true)
}

#[async_trait]
impl Plugin for DeleteHotKeyPlugin {
    fn name(&self) -> &str {
        NAME
    }

    async fn call_api(&self, api: &str, _args: Vec<Value>) -> Result<Value> {
        match api {
            "del" => Ok(Value::Bool(self.delete_active()?)),
            _ => Err(Error::ApiNotImplemented {
                plugin: NAME.to_string(),
                api: api.to_string(),
            }),
        }
    }

    fn on_hotkey(&self, key: &str, event: &KeyEvent) {
        if event.is_down() && key == "backspace" {
            if let Err(e) = self.delete_active() {
                warn!("Delete hotkey failed: {}", e);
            }
        }
    }

    /// 활성 엔티티가 있을 때만 기여
    fn context_menu(&self) -> Option<Vec<MenuEntry>> {
        self.surface.active()?;

        let surface = Arc::clone(&self.surface);
        let item = MenuItem::new("Delete", move || {
            if let Err(e) = delete_active(surface.as_ref()) {
                warn!("Delete menu action failed: {}", e);
            }
        })
        .with_hotkey("Backspace");

        Some(vec![MenuEntry::Separator, MenuEntry::Item(item)])
    }
}
