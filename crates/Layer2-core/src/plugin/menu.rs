//! Context Menu - 플러그인이 기여하는 우클릭 메뉴 항목

use std::sync::Arc;

/// 메뉴 항목 실행 콜백
pub type MenuAction = Arc<dyn Fn() + Send + Sync>;

/// 메뉴 항목
#[derive(Clone)]
pub struct MenuItem {
    pub label: String,
    /// 표시용 단축키 (예: "Backspace")
    pub hotkey: Option<String>,
    pub disabled: bool,
    on_activate: MenuAction,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, on_activate: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            hotkey: None,
            disabled: false,
            on_activate: Arc::new(on_activate),
        }
    }

    pub fn with_hotkey(mut self, hotkey: impl Into<String>) -> Self {
        self.hotkey = Some(hotkey.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// 항목 실행 (비활성 항목은 무시) - 실행 여부 반환
    pub fn activate(&self) -> bool {
        if self.disabled {
            return false;
        }
        (self.on_activate)();
        true
    }
}

impl std::fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuItem")
            .field("label", &self.label)
            .field("hotkey", &self.hotkey)
            .field("disabled", &self.disabled)
            .finish()
    }
}

/// 메뉴 엔트리
#[derive(Debug, Clone)]
pub enum MenuEntry {
    /// 구분선
    Separator,
    Item(MenuItem),
}

impl MenuEntry {
    pub fn item(label: impl Into<String>, on_activate: impl Fn() + Send + Sync + 'static) -> Self {
        Self::Item(MenuItem::new(label, on_activate))
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Separator => None,
            Self::Item(item) => Some(&item.label),
        }
    }

    pub fn as_item(&self) -> Option<&MenuItem> {
        match self {
            Self::Separator => None,
            Self::Item(item) => Some(item),
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator)
    }
}

impl From<MenuItem> for MenuEntry {
    fn from(item: MenuItem) -> Self {
        Self::Item(item)
    }
}
