//! Error types for Easel
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// 충돌한 capability 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// 플러그인이 발행하는 이벤트 이름
    Event,
    /// 호스트에 노출되는 API 메서드 이름
    Api,
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event => write!(f, "event"),
            Self::Api => write!(f, "api"),
        }
    }
}

/// Easel 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 플러그인 설치 관련
    // ========================================================================
    #[error("Plugin {plugin} is already installed")]
    DuplicatePlugin { plugin: String },

    #[error("Plugin {plugin} declares {kind} '{name}' already claimed by {owner}")]
    CapabilityConflict {
        plugin: String,
        kind: CapabilityKind,
        name: String,
        owner: String,
    },

    #[error("Plugin error: {0}")]
    Plugin(String),

    // ========================================================================
    // 단위 변환 관련
    // ========================================================================
    #[error("Invalid measurement for {name}: {value:?}")]
    InvalidMeasurement { name: String, value: String },

    #[error("DPI must be greater than 0, got {0}")]
    InvalidDpi(f64),

    // ========================================================================
    // Hook 관련
    // ========================================================================
    #[error("Hook {lane} failed in plugin {owner}: {cause}")]
    HookExecution {
        lane: String,
        owner: String,
        #[source]
        cause: Box<Error>,
    },

    #[error("Unknown lifecycle lane: {0}")]
    UnknownLane(String),

    // ========================================================================
    // 호스트 API 관련
    // ========================================================================
    #[error("Host API not found: {0}")]
    ApiNotFound(String),

    #[error("Plugin {plugin} does not implement api {api}")]
    ApiNotImplemented { plugin: String, api: String },

    #[error("Host is busy: {0}")]
    HostBusy(String),

    #[error("Host has been dropped")]
    HostDropped,

    // ========================================================================
    // 캔버스 관련
    // ========================================================================
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// 설치 단계에서 발생하는 에러인지 확인
    pub fn is_install_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicatePlugin { .. } | Error::CapabilityConflict { .. } | Error::HostBusy(_)
        )
    }

    /// Hook 실패 에러일 경우 원인 에러 반환
    pub fn hook_cause(&self) -> Option<&Error> {
        match self {
            Error::HookExecution { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// 잘못된 측정값 에러 생성 헬퍼
    pub fn invalid_measurement(name: impl Into<String>, value: impl Into<String>) -> Self {
        Error::InvalidMeasurement {
            name: name.into(),
            value: value.into(),
        }
    }

    /// capability 충돌 에러 생성 헬퍼
    pub fn conflict(
        plugin: impl Into<String>,
        kind: CapabilityKind,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Error::CapabilityConflict {
            plugin: plugin.into(),
            kind,
            name: name.into(),
            owner: owner.into(),
        }
    }

    /// Hook 실행 에러 생성 헬퍼
    pub fn hook_execution(lane: impl Into<String>, owner: impl Into<String>, cause: Error) -> Self {
        Error::HookExecution {
            lane: lane.into(),
            owner: owner.into(),
            cause: Box::new(cause),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Plugin(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Plugin(s.to_string())
    }
}
