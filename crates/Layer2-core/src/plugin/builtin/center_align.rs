//! CenterAlignPlugin - 작업 영역(`workspace` 엔티티) 기준 정렬

use super::{entity_arg, string_arg};
use crate::plugin::{MenuEntry, MenuItem, Plugin, PluginContext, PluginDescriptor};
use crate::surface::{fields, DrawingSurface, EntityId, Geometry, SignalKind};
use async_trait::async_trait;
use easel_foundation::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub const NAME: &str = "CenterAlignPlugin";

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(NAME, |ctx| Ok(Arc::new(CenterAlignPlugin::new(ctx)) as Arc<dyn Plugin>))
        .with_apis(["center", "centerH", "centerV", "position"])
}

/// 정렬 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// 가로, 세로 모두
    Center,
    /// 가로 중앙
    Horizontal,
    /// 세로 중앙
    Vertical,
}

impl Alignment {
    pub fn from_api(name: &str) -> Option<Self> {
        match name {
            "center" => Some(Self::Center),
            "centerH" => Some(Self::Horizontal),
            "centerV" => Some(Self::Vertical),
            _ => None,
        }
    }
}

pub struct CenterAlignPlugin {
    surface: Arc<dyn DrawingSurface>,
}

impl CenterAlignPlugin {
    pub fn new(ctx: PluginContext) -> Self {
        Self {
            surface: ctx.surface,
        }
    }

    /// 엔티티를 작업 영역 중심에 맞춤 - 적용한 patch 반환
    pub fn align(&self, entity: &EntityId, alignment: Alignment) -> Result<Geometry> {
        align(self.surface.as_ref(), entity, alignment)
    }
}

fn align(surface: &dyn DrawingSurface, entity: &EntityId, alignment: Alignment) -> Result<Geometry> {
    let workspace = surface
        .geometry(&EntityId::workspace())
        .ok_or_else(|| Error::EntityNotFound(EntityId::workspace().to_string()))?;
    let target = surface
        .geometry(entity)
        .ok_or_else(|| Error::EntityNotFound(entity.to_string()))?;

    let centered = |position: &str, size: &str| -> f64 {
        let origin = workspace.number(position).unwrap_or(0.0);
        let extent = workspace.number(size).unwrap_or(0.0);
        origin + extent / 2.0 - target.number(size).unwrap_or(0.0) / 2.0
    };

    let mut patch = Geometry::new();
    if matches!(alignment, Alignment::Center | Alignment::Horizontal) {
        patch.set_number(fields::LEFT, centered(fields::LEFT, fields::WIDTH))?;
    }
    if matches!(alignment, Alignment::Center | Alignment::Vertical) {
        patch.set_number(fields::TOP, centered(fields::TOP, fields::HEIGHT))?;
    }

    surface.set_geometry(entity, &patch, SignalKind::Settle)?;
    debug!(entity = %entity, alignment = ?alignment, "Aligned to workspace");
    Ok(patch)
}

#[async_trait]
impl Plugin for CenterAlignPlugin {
    fn name(&self) -> &str {
        NAME
    }

    async fn call_api(&self, api: &str, args: Vec<Value>) -> Result<Value> {
        let (alignment, entity) = match api {
            // position(name) - 활성 엔티티 정렬
            "position" => {
                let name = string_arg(&args, 0, "name")?;
                let alignment = Alignment::from_api(name).ok_or_else(|| {
                    Error::InvalidInput(format!("unknown alignment: {}", name))
                })?;
                (alignment, entity_arg(&[], 0, self.surface.as_ref())?)
            }
            other => match Alignment::from_api(other) {
                Some(alignment) => (alignment, entity_arg(&args, 0, self.surface.as_ref())?),
                None => {
                    return Err(Error::ApiNotImplemented {
                        plugin: NAME.to_string(),
                        api: api.to_string(),
                    })
                }
            },
        };

        let patch = self.align(&entity, alignment)?;
        Ok(serde_json::to_value(patch)?)
    }

    fn context_menu(&self) -> Option<Vec<MenuEntry>> {
        let active = self.surface.active()?;
        let surface = Arc::clone(&self.surface);
        let item = MenuItem::new("Center", move || {
            if let Err(e) = align(surface.as_ref(), &active, Alignment::Center) {
                warn!("Center menu action failed: {}", e);
            }
        });
        Some(vec![MenuEntry::Item(item)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginHost;
    use crate::surface::MemorySurface;
    use serde_json::json;

    async fn setup() -> (PluginHost, Arc<MemorySurface>, EntityId) {
        let surface = Arc::new(MemorySurface::with_workspace(800.0, 600.0));
        let id: EntityId = "box".into();
        surface.add_with_id(
            id.clone(),
            "rect",
            Geometry::new()
                .with(fields::LEFT, 5.0)
                .with(fields::TOP, 7.0)
                .with(fields::WIDTH, 100.0)
                .with(fields::HEIGHT, 50.0),
        );
        let host = PluginHost::new(surface.clone()).unwrap();
        host.install(descriptor(), Value::Null).await.unwrap();
        (host, surface, id)
    }

    #[tokio::test]
    async fn test_center_variants() {
        let (host, surface, id) = setup().await;

        host.invoke("centerH", vec![json!("box")]).await.unwrap();
        let geometry = surface.geometry(&id).unwrap();
        assert_eq!(geometry.number(fields::LEFT), Some(350.0));
        assert_eq!(geometry.number(fields::TOP), Some(7.0));

        host.invoke("centerV", vec![json!("box")]).await.unwrap();
        assert_eq!(surface.geometry(&id).unwrap().number(fields::TOP), Some(275.0));
    }

    #[tokio::test]
    async fn test_position_uses_active_entity() {
        let (host, surface, id) = setup().await;

        assert!(host.invoke("position", vec![json!("center")]).await.is_err());
        assert!(host.collect_menu().is_empty());

        surface.set_active(Some(id.clone()));
        let patch = host.invoke("position", vec![json!("center")]).await.unwrap();
        assert_eq!(patch, json!({ "left": 350.0, "top": 275.0 }));

        assert!(matches!(
            host.invoke("position", vec![json!("diagonal")]).await,
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(host.collect_menu()[0].label(), Some("Center"));
    }
}
