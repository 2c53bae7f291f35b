//! RulerPlugin - 눈금자 상태와 가이드라인 표시
//!
//! 저장 직전(`hookSaveBefore`)에 가이드라인을 숨기고 저장 직후(`hookSaveAfter`)에 복원합니다.
//! 눈금자 단위는 전역 단위 상태를 따라갑니다.

use crate::plugin::{HostHandle, Plugin, PluginContext, PluginDescriptor};
use crate::surface::{fields, kinds, DrawingSurface, EntityId, Geometry, SignalKind};
use async_trait::async_trait;
use easel_foundation::{Error, Result, UnitSetting, LANE_SAVE_AFTER, LANE_SAVE_BEFORE};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

pub const NAME: &str = "RulerPlugin";

/// 눈금자 활성/비활성 시 발행
pub const RULER_CHANGE: &str = "rulerChange";

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(NAME, |ctx| Ok(Arc::new(RulerPlugin::new(ctx)?) as Arc<dyn Plugin>))
        .with_events([RULER_CHANGE])
        .with_apis([
            "hideGuideline",
            "showGuideline",
            "rulerEnable",
            "rulerDisable",
            "rulerState",
        ])
}

#[derive(Debug, Default)]
struct RulerState {
    enabled: bool,
    /// 숨긴 가이드라인 (복원 대상)
    hidden: Vec<EntityId>,
}

pub struct RulerPlugin {
    surface: Arc<dyn DrawingSurface>,
    host: HostHandle,
    units: watch::Receiver<UnitSetting>,
    state: Mutex<RulerState>,
}

impl RulerPlugin {
    pub fn new(ctx: PluginContext) -> Result<Self> {
        let units = ctx.host.upgrade()?.unit_state().subscribe();
        let enabled = ctx.option_bool("enabled").unwrap_or(true);
        Ok(Self {
            surface: ctx.surface,
            host: ctx.host,
            units,
            state: Mutex::new(RulerState {
                enabled,
                hidden: Vec::new(),
            }),
        })
    }

    /// 보이는 가이드라인을 숨김 - 숨긴 수 반환
    pub fn hide_guidelines(&self) -> Result<usize> {
        let patch = Geometry::new().with_value(fields::VISIBLE, Value::Bool(false));
        let mut hidden = Vec::new();

        for id in self.surface.entities() {
            let Some(record) = self.surface.entity(&id) else {
                continue;
            };
            let visible = record.geometry.get(fields::VISIBLE) != Some(&Value::Bool(false));
            if record.kind == kinds::GUIDELINE && visible {
                self.surface.set_geometry(&id, &patch, SignalKind::Settle)?;
                hidden.push(id);
            }
        }

        let count = hidden.len();
        self.state.lock().hidden.extend(hidden);
        debug!(count, "Guidelines hidden");
        Ok(count)
    }

    /// 숨겼던 가이드라인 복원 - 복원 수 반환
    pub fn show_guidelines(&self) -> Result<usize> {
        let hidden = std::mem::take(&mut self.state.lock().hidden);
        let patch = Geometry::new().with_value(fields::VISIBLE, Value::Bool(true));

        let mut restored = 0;
        for id in hidden {
            // 저장 중에 삭제된 가이드라인은 건너뜀
            if self.surface.entity(&id).is_some() {
                self.surface.set_geometry(&id, &patch, SignalKind::Settle)?;
                restored += 1;
            }
        }
        debug!(count = restored, "Guidelines restored");
        Ok(restored)
    }

    async fn set_enabled(&self, enabled: bool) -> Result<Value> {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.enabled != enabled;
            state.enabled = enabled;
            changed
        };

        if changed {
            self.host
                .upgrade()?
                .emit(RULER_CHANGE, json!({ "enabled": enabled }))
                .await;
        }
        Ok(Value::Bool(enabled))
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    fn snapshot(&self) -> Value {
        let unit = self.units.borrow().unit;
        let state = self.state.lock();
        json!({
            "enabled": state.enabled,
            "unit": unit,
            "hiddenGuidelines": state.hidden.len(),
        })
    }
}

#[async_trait]
impl Plugin for RulerPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn hooks(&self) -> Vec<String> {
        vec![LANE_SAVE_BEFORE.to_string(), LANE_SAVE_AFTER.to_string()]
    }

    async fn on_hook(&self, lane: &str, _payload: Value) -> Result<Option<Value>> {
        match lane {
            LANE_SAVE_BEFORE => {
                self.hide_guidelines()?;
            }
            LANE_SAVE_AFTER => {
                self.show_guidelines()?;
            }
            _ => {}
        }
        Ok(None)
    }

    async fn call_api(&self, api: &str, _args: Vec<Value>) -> Result<Value> {
        match api {
            "hideGuideline" => Ok(json!(self.hide_guidelines()?)),
            "showGuideline" => Ok(json!(self.show_guidelines()?)),
            "rulerEnable" => self.set_enabled(true).await,
            "rulerDisable" => self.set_enabled(false).await,
            "rulerState" => Ok(self.snapshot()),
            _ => Err(Error::ApiNotImplemented {
                plugin: NAME.to_string(),
                api: api.to_string(),
            }),
        }
    }
}
