//! Hook Pipeline - lane 등록 및 순차 실행

use super::types::{HookHandler, LaneEntry, LaneRun};
use crate::{Error, Result};
use easel_foundation::HostConfig;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Lifecycle lane 실행기
pub struct HookPipeline {
    /// 인식하는 lane 이름 (설정 순서)
    names: Vec<String>,

    /// lane 이름 -> 설치 순서대로의 핸들러
    lanes: RwLock<HashMap<String, Vec<LaneEntry>>>,
}

impl HookPipeline {
    /// 인식할 lane 목록으로 생성
    pub fn new(lanes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut names: Vec<String> = Vec::new();
        for lane in lanes {
            let lane = lane.into();
            if !names.contains(&lane) {
                names.push(lane);
            }
        }

        let lanes = names
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();

        Self {
            names,
            lanes: RwLock::new(lanes),
        }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(config.lanes.iter().cloned())
    }

    /// 인식하는 lane 목록
    pub fn lanes(&self) -> &[String] {
        &self.names
    }

    pub fn is_lane(&self, lane: &str) -> bool {
        self.names.iter().any(|name| name == lane)
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// lane 끝에 핸들러 추가
    ///
    /// 한 플러그인은 lane 하나에 핸들러 하나만 가질 수 있습니다.
    pub fn register(&self, lane: &str, owner: impl Into<String>, handler: HookHandler) -> Result<()> {
        let owner = owner.into();
        let mut lanes = self.lanes.write();
        let entries = lanes
            .get_mut(lane)
            .ok_or_else(|| Error::UnknownLane(lane.to_string()))?;

        if entries.iter().any(|entry| entry.owner == owner) {
            return Err(Error::InvalidInput(format!(
                "Plugin {} already has a handler in {}",
                owner, lane
            )));
        }

        entries.push(LaneEntry {
            owner: owner.clone(),
            handler,
        });
        debug!(lane = %lane, plugin = %owner, position = entries.len(), "Registered hook");
        Ok(())
    }

    /// 소유자의 핸들러를 모든 lane에서 제거 (남은 핸들러 순서 유지)
    ///
    /// 제거된 핸들러 수를 반환합니다.
    pub fn unregister(&self, owner: &str) -> usize {
        let mut lanes = self.lanes.write();
        let mut removed = 0;
        for entries in lanes.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.owner != owner);
            removed += before - entries.len();
        }
        if removed > 0 {
            debug!(plugin = %owner, removed, "Unregistered hooks");
        }
        removed
    }

    /// lane의 핸들러 소유자 목록 (실행 순서)
    pub fn handlers(&self, lane: &str) -> Vec<String> {
        self.lanes
            .read()
            .get(lane)
            .map(|entries| entries.iter().map(|entry| entry.owner.clone()).collect())
            .unwrap_or_default()
    }

    /// 모든 핸들러 제거 (lane 목록은 유지)
    pub fn clear(&self) {
        for entries in self.lanes.write().values_mut() {
            entries.clear();
        }
    }

    // ========================================================================
    // 실행
    // ========================================================================

    /// lane 실행 - 최종 payload 반환
    pub async fn run(&self, lane: &str, payload: Value) -> Result<Value> {
        self.run_traced(lane, payload).await.map(|run| run.payload)
    }

    /// lane 실행 - 실행 기록 포함
    ///
    /// 실행 시작 시점의 핸들러 목록을 사용합니다.
    /// 첫 실패에서 멈추며 이후 핸들러는 실행되지 않습니다.
    pub async fn run_traced(&self, lane: &str, payload: Value) -> Result<LaneRun> {
        let entries: Vec<LaneEntry> = self
            .lanes
            .read()
            .get(lane)
            .cloned()
            .ok_or_else(|| Error::UnknownLane(lane.to_string()))?;

        let start = Instant::now();
        let mut payload = payload;
        let mut executed = Vec::with_capacity(entries.len());

        debug!(lane = %lane, handlers = entries.len(), "Running lane");

        for entry in entries {
            match (entry.handler)(payload.clone()).await {
                Ok(Some(next)) => payload = next,
                Ok(None) => {}
                Err(e) => {
                    warn!(lane = %lane, plugin = %entry.owner, "Hook failed: {}", e);
                    return Err(Error::hook_execution(lane, entry.owner, e));
                }
            }
            executed.push(entry.owner);
        }

        Ok(LaneRun {
            lane: lane.to_string(),
            executed,
            payload,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
