//! Structured errors for recording and playback

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("[{code:?}] {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConfigMissing,
    ConfigInvalid,
    FileNotFound,
    DecodeError,
    UnknownEventVariant,
    HookSubscriptionFailed,
    RedundantStart,
    RedundantStop,
    NothingToPlay,
    ModeMismatch,
    Io,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_missing(param: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissing,
            format!("Missing configuration parameter: {}", param),
        )
    }

    pub fn file_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("File not found: {}", path.as_ref().display()),
        )
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecodeError, reason)
    }

    pub fn unknown_variant(device_type: &str) -> Self {
        Self::new(
            ErrorCode::UnknownEventVariant,
            format!("Unknown DeviceType: {}", device_type),
        )
    }

    pub fn hook_subscription(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::HookSubscriptionFailed, reason)
    }

    pub fn redundant_start(what: &str) -> Self {
        Self::new(
            ErrorCode::RedundantStart,
            format!("{} already active", what),
        )
    }

    pub fn redundant_stop(what: &str) -> Self {
        Self::new(ErrorCode::RedundantStop, format!("{} not active", what))
    }

    pub fn nothing_to_play() -> Self {
        Self::new(ErrorCode::NothingToPlay, "No input events loaded")
    }

    pub fn mode_mismatch(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModeMismatch, reason)
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::new(ErrorCode::Io, e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        let code = match e.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            _ => ErrorCode::Io,
        };
        Self::new(code, e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::decode(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::new(ErrorCode::ConfigInvalid, e.to_string())
    }
}
