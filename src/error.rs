//! Crate-wide error type.
//!
//! Nothing here is ever shown to the player as an error message; the shell
//! logs these and the game keeps mocking the player as usual.

use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::registry::LevelId;

#[derive(Debug, Error)]
pub enum GauntletError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level {0} is already registered")]
    DuplicateLevel(LevelId),

    #[error("level id {0} is not valid (ids start at 1)")]
    InvalidLevelId(LevelId),

    #[error("level {level} failed to mount: {reason}")]
    Mount { level: LevelId, reason: String },

    #[error("level {0} is not complete yet; navigation is locked")]
    NavigationLocked(LevelId),

    #[error("browser API failure: {0}")]
    Dom(String),
}

pub type Result<T> = std::result::Result<T, GauntletError>;

impl GauntletError {
    pub fn dom(msg: impl Into<String>) -> Self {
        Self::Dom(msg.into())
    }
}

impl From<JsValue> for GauntletError {
    fn from(value: JsValue) -> Self {
        match value.as_string() {
            Some(s) => Self::Dom(s),
            None => Self::Dom(format!("{value:?}")),
        }
    }
}

impl From<GauntletError> for JsValue {
    fn from(err: GauntletError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_error_names_the_level() {
        let err = GauntletError::Mount {
            level: 7,
            reason: "no button".into(),
        };
        assert_eq!(err.to_string(), "level 7 failed to mount: no button");
    }

    #[test]
    fn parse_errors_convert_from_serde_json() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: GauntletError = bad.into();
        assert!(matches!(err, GauntletError::Parse(_)));
    }
}
