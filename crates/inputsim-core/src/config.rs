//! Input simulation configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration, usually read from `inputsim.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSimConfig {
    pub recorder: RecorderConfig,
    pub player: PlayerConfig,
}

impl InputSimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Directory recordings are written to. Required to start a recording.
    pub output_dir: Option<PathBuf>,
    /// Period of the background flush loop in ms
    pub flush_interval_ms: u64,
    /// Minimum spacing between two recorded pointer moves in ms
    pub mouse_move_min_interval_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            flush_interval_ms: 5000,
            mouse_move_min_interval_ms: 16, // ~60 Hz
        }
    }
}

impl RecorderConfig {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    /// The output directory, or `ConfigMissing` when it was never set.
    pub fn require_output_dir(&self) -> Result<&Path> {
        self.output_dir
            .as_deref()
            .ok_or_else(|| Error::config_missing("recorder.output_dir"))
    }
}

/// Player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// How often a paused playback loop re-checks its flags
    pub pause_poll_ms: u64,
    /// Upper bound on a single wait while an event is not yet due
    pub max_sleep_step_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            pause_poll_ms: 10,
            max_sleep_step_ms: 5,
        }
    }
}

impl PlayerConfig {
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms.max(1))
    }

    /// Sleep for the remaining wait, capped to the step size and at least 1ms.
    pub fn sleep_step(&self, remaining_ms: i64) -> Duration {
        let step = remaining_ms.clamp(1, self.max_sleep_step_ms.max(1) as i64);
        Duration::from_millis(step as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    #[test]
    fn test_defaults() {
        let config = InputSimConfig::default();
        assert!(config.recorder.output_dir.is_none());
        assert_eq!(config.recorder.flush_interval_ms, 5000);
        assert_eq!(config.recorder.mouse_move_min_interval_ms, 16);
        assert_eq!(config.player.pause_poll_ms, 10);
        assert_eq!(config.player.max_sleep_step_ms, 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = InputSimConfig::from_toml_str(
            r#"
            [recorder]
            output_dir = "/tmp/inputs"
            "#,
        )
        .unwrap();
        assert_eq!(config.recorder.output_dir, Some(PathBuf::from("/tmp/inputs")));
        assert_eq!(config.recorder.flush_interval_ms, 5000);
        assert_eq!(config.player.max_sleep_step_ms, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputsim.toml");
        std::fs::write(
            &path,
            "[recorder]\nflush_interval_ms = 250\nmouse_move_min_interval_ms = 8\n",
        )
        .unwrap();

        let config = InputSimConfig::load(&path).unwrap();
        assert_eq!(config.recorder.flush_interval_ms, 250);
        assert_eq!(config.recorder.mouse_move_min_interval_ms, 8);
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let err = InputSimConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(err.is(ErrorCode::FileNotFound));

        let err = InputSimConfig::from_toml_str("[recorder]\nflush_interval_ms = \"soon\"").unwrap_err();
        assert!(err.is(ErrorCode::ConfigInvalid));
    }

    #[test]
    fn test_require_output_dir() {
        let err = RecorderConfig::default().require_output_dir().unwrap_err();
        assert!(err.is(ErrorCode::ConfigMissing));

        let config = RecorderConfig::default().with_output_dir("/tmp/rec");
        assert_eq!(config.require_output_dir().unwrap(), Path::new("/tmp/rec"));
    }

    #[test]
    fn test_sleep_step_is_bounded() {
        let config = PlayerConfig::default();
        assert_eq!(config.sleep_step(1000), Duration::from_millis(5));
        assert_eq!(config.sleep_step(3), Duration::from_millis(3));
        assert_eq!(config.sleep_step(0), Duration::from_millis(1));
    }
}
