//! Global input hook capability.
//!
//! The host owns the OS-level hook. The recorder subscribes a sink to it and
//! receives raw press/release/move notifications, possibly from several
//! threads at once.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw notification delivered by a hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawInput {
    KeyPressed { key: String },
    KeyReleased { key: String },
    MousePressed { button: String, x: i16, y: i16 },
    MouseReleased { button: String, x: i16, y: i16 },
    MouseMoved { x: i16, y: i16 },
}

impl RawInput {
    pub fn key_pressed(key: impl Into<String>) -> Self {
        Self::KeyPressed { key: key.into() }
    }

    pub fn key_released(key: impl Into<String>) -> Self {
        Self::KeyReleased { key: key.into() }
    }

    pub fn mouse_pressed(button: impl Into<String>, x: i16, y: i16) -> Self {
        Self::MousePressed {
            button: button.into(),
            x,
            y,
        }
    }

    pub fn mouse_released(button: impl Into<String>, x: i16, y: i16) -> Self {
        Self::MouseReleased {
            button: button.into(),
            x,
            y,
        }
    }

    pub fn mouse_moved(x: i16, y: i16) -> Self {
        Self::MouseMoved { x, y }
    }
}

/// Callback a hook delivers raw input to
pub type HookSink = Arc<dyn Fn(RawInput) + Send + Sync>;

/// Input hook capability consumed by the recorder.
pub trait InputHook: Send {
    /// Start delivering input to `sink`. Replaces any previous sink.
    fn subscribe(&mut self, sink: HookSink) -> Result<()>;

    /// Stop delivering input. Must be safe to call when not subscribed.
    fn unsubscribe(&mut self);
}
