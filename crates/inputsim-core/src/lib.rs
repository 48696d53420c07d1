//! inputsim-core - Shared building blocks for input simulation
//!
//! Errors, configuration, session clocks and the two host capabilities the
//! recorder and player depend on:
//!
//! - [`InputHook`]: delivers raw keyboard/mouse notifications while recording
//! - [`InputInjector`]: replays keyboard/mouse actions during playback
//!
//! The OS-level mechanisms behind both traits live in the host.

pub mod clock;
pub mod config;
pub mod error;
pub mod hook;
pub mod input;

pub use clock::{Clock, MockClock, Stopwatch, SystemClock};
pub use config::{InputSimConfig, PlayerConfig, RecorderConfig};
pub use error::{Error, ErrorCode, Result};
pub use hook::{HookSink, InputHook, RawInput};
pub use input::InputInjector;

pub mod prelude {
    pub use crate::clock::{Clock, Stopwatch, SystemClock};
    pub use crate::config::{InputSimConfig, PlayerConfig, RecorderConfig};
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::hook::{HookSink, InputHook, RawInput};
    pub use crate::input::InputInjector;
}
