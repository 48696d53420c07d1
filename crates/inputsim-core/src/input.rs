//! Keyboard and mouse input injection.
//!
//! The host provides the actual injection mechanism; playback only talks to
//! this trait. Keys and buttons use the same symbolic names the recorder
//! stores (`"VcA"`, `"Button1"`, ...).

use crate::Result;

/// Input injection capability consumed by playback.
pub trait InputInjector: Send + Sync {
    /// Press or release a key
    fn key(&self, key: &str, is_pressed: bool) -> Result<()>;

    /// Move the pointer to absolute screen coordinates
    fn move_pointer(&self, x: i16, y: i16) -> Result<()>;

    /// Press or release a mouse button at the current pointer position
    fn mouse_button(&self, button: &str, is_pressed: bool) -> Result<()>;
}

impl<T: InputInjector + ?Sized> InputInjector for std::sync::Arc<T> {
    fn key(&self, key: &str, is_pressed: bool) -> Result<()> {
        (**self).key(key, is_pressed)
    }

    fn move_pointer(&self, x: i16, y: i16) -> Result<()> {
        (**self).move_pointer(x, y)
    }

    fn mouse_button(&self, button: &str, is_pressed: bool) -> Result<()> {
        (**self).mouse_button(button, is_pressed)
    }
}
