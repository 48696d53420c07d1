//! # inputsim
//!
//! Record and replay keyboard/mouse sessions for automated test runs.
//!
//! ## Features
//!
//! - **Recording**: continuous (timestamped) or frame-sampled capture
//! - **Replay**: wall-clock playback with pause, or frame-synchronised playback
//! - **Storage**: plain JSON event logs, readable while still being written
//!
//! The OS input hook and injector are supplied by the host through
//! [`InputHook`] and [`InputInjector`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inputsim::prelude::*;
//!
//! fn record_then_replay(
//!     hook: impl InputHook + 'static,
//!     injector: impl InputInjector + 'static,
//! ) -> inputsim::Result<()> {
//!     let config = InputSimConfig::load("inputsim.toml")?;
//!
//!     let recorder = InputRecorder::new(config.recorder.clone(), hook);
//!     let path = recorder.start_recording(Some("login"), true)?;
//!     // ... drive the application ...
//!     recorder.stop_recording();
//!
//!     let player = InputPlayer::new(config.player, injector);
//!     player.load_file(&path)?;
//!     player.start_continuous_playback()?;
//!     Ok(())
//! }
//! ```

// Re-export core building blocks
pub use inputsim_core::*;

// Re-export recorder module
pub use inputsim_recorder as recorder;

pub use inputsim_recorder::{
    DeviceType, EventLogWriter, InputEvent, InputPlayer, InputRecorder, KeyboardEvent,
    MouseEvent, PlaybackStopped, RecordingMode, RecordingStopped, RecordingStorage, ReplayStats,
};

/// Prelude - import everything you need
pub mod prelude {
    pub use inputsim_core::prelude::*;
    pub use inputsim_recorder::prelude::*;
}
