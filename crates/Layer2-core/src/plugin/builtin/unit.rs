//! UnitPlugin - 단위 변환과 origin-size 기록 API

use super::{entity_arg, number_arg, object_arg, optional_number_arg, unit_arg};
use crate::plugin::{HostHandle, Plugin, PluginContext, PluginDescriptor};
use crate::surface::{DrawingSurface, Geometry};
use crate::sync::UnitSnapshot;
use async_trait::async_trait;
use easel_foundation::{Error, Result, Rounding};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "UnitPlugin";

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(NAME, |ctx| Ok(Arc::new(UnitPlugin::new(ctx)) as Arc<dyn Plugin>))
        .with_apis([
            "getSizeByUnit",
            "getCurrentSizeByPx",
            "applyObjectByUnit",
            "setOriginSize",
            "getOriginSize",
        ])
}

pub struct UnitPlugin {
    surface: Arc<dyn DrawingSurface>,
    host: HostHandle,
}

impl UnitPlugin {
    pub fn new(ctx: PluginContext) -> Self {
        Self {
            surface: ctx.surface,
            host: ctx.host,
        }
    }

    /// `getSizeByUnit(px, unit?)` - px를 지정 단위(기본: 현재 단위)로
    fn size_by_unit(&self, args: &[Value]) -> Result<Value> {
        let host = self.host.upgrade()?;
        let px = number_arg(args, 0, "px")?;
        let unit = unit_arg(args, 1)?.unwrap_or_else(|| host.get_unit());
        let value = host.converter().px_to_unit(px, unit, None)?;
        Ok(json!(value))
    }

    /// `getCurrentSizeByPx(value)` - 현재 단위 값을 px로 (올림)
    fn current_size_by_px(&self, args: &[Value]) -> Result<Value> {
        let host = self.host.upgrade()?;
        let value = number_arg(args, 0, "value")?;
        let px = host
            .converter()
            .unit_to_px(value, host.get_unit(), None, Rounding::Ceil)?;
        Ok(json!(px))
    }

    /// `applyObjectByUnit(entity?, patch, unit?, dpi?)`
    fn apply_by_unit(&self, args: &[Value]) -> Result<Value> {
        let host = self.host.upgrade()?;
        let entity = entity_arg(args, 0, self.surface.as_ref())?;
        let patch = Geometry::from_map(&object_arg(args, 1)?)?;
        let unit = unit_arg(args, 2)?.unwrap_or_else(|| host.get_unit());
        let dpi = optional_number_arg(args, 3, "dpi")?;

        host.synchronizer()
            .apply_in_unit(self.surface.as_ref(), &entity, unit, &patch, dpi)?;
        debug!(entity = %entity, unit = %unit, "Applied geometry by unit");
        Ok(Value::Null)
    }

    /// `setOriginSize(entity?, unit, record)`
    fn set_origin_size(&self, args: &[Value]) -> Result<Value> {
        let host = self.host.upgrade()?;
        let entity = entity_arg(args, 0, self.surface.as_ref())?;
        let unit = unit_arg(args, 1)?
            .ok_or_else(|| Error::InvalidInput("setOriginSize requires a unit".into()))?;
        let record: UnitSnapshot = serde_json::from_value(Value::Object(object_arg(args, 2)?))?;

        host.synchronizer().set_origin_size(&entity, unit, record);
        Ok(Value::Null)
    }

    /// `getOriginSize(entity?)` - 기록이 없으면 null
    fn get_origin_size(&self, args: &[Value]) -> Result<Value> {
        let host = self.host.upgrade()?;
        let entity = entity_arg(args, 0, self.surface.as_ref())?;
        match host.synchronizer().origin_size(&entity) {
            Some(map) => Ok(serde_json::to_value(map)?),
            None => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl Plugin for UnitPlugin {
    fn name(&self) -> &str {
        NAME
    }

    async fn call_api(&self, api: &str, args: Vec<Value>) -> Result<Value> {
        match api {
            "getSizeByUnit" => self.size_by_unit(&args),
            "getCurrentSizeByPx" => self.current_size_by_px(&args),
            "applyObjectByUnit" => self.apply_by_unit(&args),
            "setOriginSize" => self.set_origin_size(&args),
            "getOriginSize" => self.get_origin_size(&args),
            _ => Err(Error::ApiNotImplemented {
                plugin: NAME.to_string(),
                api: api.to_string(),
            }),
        }
    }
}
