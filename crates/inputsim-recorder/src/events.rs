//! Input event types
//!
//! Events serialize to flat JSON objects discriminated by `DeviceType`.
//! Optional fields (`FrameId`, `Button`) are omitted when absent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device discriminator stored in every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Keyboard,
    Mouse,
}

impl DeviceType {
    pub const ALL: [DeviceType; 2] = [DeviceType::Keyboard, DeviceType::Mouse];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Keyboard => "Keyboard",
            DeviceType::Mouse => "Mouse",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which timing discipline a session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingMode {
    /// Timestamps only, replayed against a wall clock
    Continuous,
    /// Every event carries the frame id it was sampled on
    Frame,
}

impl RecordingMode {
    pub fn from_continuous(continuous: bool) -> Self {
        if continuous {
            Self::Continuous
        } else {
            Self::Frame
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous)
    }
}

/// Key press or release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyboardEvent {
    /// Milliseconds since session start
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<i64>,
    pub key: String,
    pub is_pressed: bool,
}

impl KeyboardEvent {
    pub fn new(timestamp: i64, key: impl Into<String>, is_pressed: bool) -> Self {
        Self {
            timestamp,
            frame_id: None,
            key: key.into(),
            is_pressed,
        }
    }

    pub fn at_frame(mut self, frame_id: i64) -> Self {
        self.frame_id = Some(frame_id);
        self
    }
}

/// Pointer movement, optionally with a button state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MouseEvent {
    /// Milliseconds since session start
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<i64>,
    pub x: i16,
    pub y: i16,
    /// `None` means pure movement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    pub is_pressed: bool,
}

impl MouseEvent {
    pub fn movement(timestamp: i64, x: i16, y: i16) -> Self {
        Self {
            timestamp,
            frame_id: None,
            x,
            y,
            button: None,
            is_pressed: false,
        }
    }

    pub fn button(timestamp: i64, button: impl Into<String>, x: i16, y: i16, is_pressed: bool) -> Self {
        Self {
            timestamp,
            frame_id: None,
            x,
            y,
            button: Some(button.into()),
            is_pressed,
        }
    }

    pub fn at_frame(mut self, frame_id: i64) -> Self {
        self.frame_id = Some(frame_id);
        self
    }

    pub fn is_movement(&self) -> bool {
        self.button.is_none()
    }
}

/// A recorded input event - closed set of device variants.
///
/// Decoding goes through [`crate::codec`], which checks the discriminator
/// before picking a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "DeviceType")]
pub enum InputEvent {
    Keyboard(KeyboardEvent),
    Mouse(MouseEvent),
}

impl InputEvent {
    pub fn device_type(&self) -> DeviceType {
        match self {
            InputEvent::Keyboard(_) => DeviceType::Keyboard,
            InputEvent::Mouse(_) => DeviceType::Mouse,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            InputEvent::Keyboard(e) => e.timestamp,
            InputEvent::Mouse(e) => e.timestamp,
        }
    }

    pub fn frame_id(&self) -> Option<i64> {
        match self {
            InputEvent::Keyboard(e) => e.frame_id,
            InputEvent::Mouse(e) => e.frame_id,
        }
    }
}

impl From<KeyboardEvent> for InputEvent {
    fn from(e: KeyboardEvent) -> Self {
        InputEvent::Keyboard(e)
    }
}

impl From<MouseEvent> for InputEvent {
    fn from(e: MouseEvent) -> Self {
        InputEvent::Mouse(e)
    }
}
