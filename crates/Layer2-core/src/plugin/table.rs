//! Plugin Table - 설치 순서를 보존하는 플러그인 저장소

use super::descriptor::PluginInfo;
use super::traits::Plugin;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 설치된 플러그인 정보
pub struct PluginEntry {
    /// 플러그인 인스턴스
    pub plugin: Arc<dyn Plugin>,

    /// 선언 및 등록 요약
    pub info: PluginInfo,
}

/// 플러그인 테이블 - 이름으로 조회, 설치 순서로 열거
pub struct PluginTable {
    /// 플러그인 저장소 (이름 -> PluginEntry)
    plugins: RwLock<HashMap<String, PluginEntry>>,

    /// 로드 카운터
    load_counter: RwLock<usize>,
}

impl PluginTable {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
            load_counter: RwLock::new(0),
        }
    }

    /// 다음 설치 순번
    pub fn next_order(&self) -> usize {
        let mut counter = self.load_counter.write();
        *counter += 1;
        *counter
    }

    /// 플러그인 기록 - 같은 이름이 있으면 false
    pub fn insert(&self, plugin: Arc<dyn Plugin>, info: PluginInfo) -> bool {
        let mut plugins = self.plugins.write();
        if plugins.contains_key(&info.name) {
            return false;
        }

        info!("Installed plugin: {} (#{})", info.name, info.load_order);
        plugins.insert(info.name.clone(), PluginEntry { plugin, info });
        true
    }

    /// 플러그인 제거
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        let removed = self.plugins.write().remove(name);
        removed.map(|entry| {
            info!("Uninstalled plugin: {}", name);
            entry.plugin
        })
    }

    /// 플러그인 조회
    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins
            .read()
            .get(name)
            .map(|entry| Arc::clone(&entry.plugin))
    }

    pub fn info(&self, name: &str) -> Option<PluginInfo> {
        self.plugins.read().get(name).map(|entry| entry.info.clone())
    }

    /// 설치 순서대로의 플러그인 인스턴스
    pub fn ordered(&self) -> Vec<(String, Arc<dyn Plugin>)> {
        let plugins = self.plugins.read();
        let mut entries: Vec<_> = plugins.values().collect();
        entries.sort_by_key(|entry| entry.info.load_order);
        entries
            .iter()
            .map(|entry| (entry.info.name.clone(), Arc::clone(&entry.plugin)))
            .collect()
    }

    /// 설치 순서대로의 요약
    pub fn infos(&self) -> Vec<PluginInfo> {
        let plugins = self.plugins.read();
        let mut infos: Vec<PluginInfo> = plugins.values().map(|entry| entry.info.clone()).collect();
        infos.sort_by_key(|info| info.load_order);
        infos
    }

    pub fn names(&self) -> Vec<String> {
        self.infos().into_iter().map(|info| info.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }

    /// 모든 플러그인 제거 - 제거된 인스턴스를 설치 역순으로 반환
    pub fn drain_reversed(&self) -> Vec<(String, Arc<dyn Plugin>)> {
        let mut ordered = self.ordered();
        self.plugins.write().clear();
        *self.load_counter.write() = 0;
        ordered.reverse();
        ordered
    }
}

impl Default for PluginTable {
    fn default() -> Self {
        Self::new()
    }
}
