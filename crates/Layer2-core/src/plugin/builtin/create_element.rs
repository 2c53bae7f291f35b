//! CreateElementPlugin - 현재 단위로 도형 생성
//!
//! 옵션의 길이 필드(left, top, width, ...)와 점 목록은 현재 단위로 해석되어
//! 반올림 없이 px로 변환됩니다. 입력값은 해당 단위의 origin-size 기록으로 남습니다.

use super::{arg, object_arg, optional_number_arg, string_arg};
use crate::plugin::{HostHandle, Plugin, PluginContext, PluginDescriptor};
use crate::surface::{fields, kinds, DrawingSurface, EntityId, Geometry, Point};
use async_trait::async_trait;
use easel_foundation::{Error, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

pub const NAME: &str = "CreateElementPlugin";

/// 엔티티 생성 시 발행
pub const ELEMENT_CREATED: &str = "elementCreated";

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(NAME, |ctx| Ok(Arc::new(CreateElementPlugin::new(ctx)) as Arc<dyn Plugin>))
        .with_events([ELEMENT_CREATED])
        .with_apis([
            "createRect",
            "createEllipse",
            "createText",
            "createLine",
            "createPolygon",
        ])
}

pub struct CreateElementPlugin {
    surface: Arc<dyn DrawingSurface>,
    host: HostHandle,
}

impl CreateElementPlugin {
    pub fn new(ctx: PluginContext) -> Self {
        Self {
            surface: ctx.surface,
            host: ctx.host,
        }
    }

    /// 현재 단위의 patch로 엔티티 생성 - 새 ID 반환
    pub async fn create(&self, kind: &str, patch: Geometry, dpi: Option<f64>) -> Result<EntityId> {
        let host = self.host.upgrade()?;
        let unit = host.get_unit();

        let id = EntityId::new();
        self.surface.add_with_id(id.clone(), kind, Geometry::new());
        if let Err(e) = host
            .synchronizer()
            .apply_in_unit(self.surface.as_ref(), &id, unit, &patch, dpi)
        {
            // 변환 실패 시 빈 엔티티를 남기지 않음
            self.surface.remove(&id)?;
            return Err(e);
        }
        self.surface.set_active(Some(id.clone()));

        info!(entity = %id, kind = %kind, unit = %unit, "Created element");
        host.emit(
            ELEMENT_CREATED,
            json!({ "id": id, "kind": kind, "unit": unit }),
        )
        .await;
        Ok(id)
    }
}

fn points_arg(args: &[Value], index: usize) -> Result<Vec<Point>> {
    let value = arg(args, index)
        .cloned()
        .ok_or_else(|| Error::InvalidInput("missing points argument".into()))?;
    Ok(serde_json::from_value(value)?)
}

fn with_points(options: Map<String, Value>, points: Vec<Point>) -> Result<Geometry> {
    Ok(Geometry::from_map(&options)?.with_points(points))
}

#[async_trait]
impl Plugin for CreateElementPlugin {
    fn name(&self) -> &str {
        NAME
    }

    async fn call_api(&self, api: &str, args: Vec<Value>) -> Result<Value> {
        let (kind, patch, dpi) = match api {
            // createRect(options, dpi?)
            "createRect" => (
                kinds::RECT,
                Geometry::from_map(&object_arg(&args, 0)?)?,
                optional_number_arg(&args, 1, "dpi")?,
            ),
            // createEllipse(options, dpi?)
            "createEllipse" => (
                kinds::ELLIPSE,
                Geometry::from_map(&object_arg(&args, 0)?)?,
                optional_number_arg(&args, 1, "dpi")?,
            ),
            // createText(text, options, dpi?)
            "createText" => {
                let text = string_arg(&args, 0, "text")?;
                let patch = Geometry::from_map(&object_arg(&args, 1)?)?
                    .with_value(fields::TEXT, Value::String(text.to_string()));
                (kinds::TEXT, patch, optional_number_arg(&args, 2, "dpi")?)
            }
            // createLine(points, options, dpi?)
            "createLine" => (
                kinds::LINE,
                with_points(object_arg(&args, 1)?, points_arg(&args, 0)?)?,
                optional_number_arg(&args, 2, "dpi")?,
            ),
            // createPolygon(points, options, dpi?)
            "createPolygon" => (
                kinds::POLYGON,
                with_points(object_arg(&args, 1)?, points_arg(&args, 0)?)?,
                optional_number_arg(&args, 2, "dpi")?,
            ),
            _ => {
                return Err(Error::ApiNotImplemented {
                    plugin: NAME.to_string(),
                    api: api.to_string(),
                })
            }
        };

        let id = self.create(kind, patch, dpi).await?;
        Ok(Value::String(id.to_string()))
    }
}
