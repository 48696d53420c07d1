//! inputsim-recorder - Keyboard/mouse session recording and replay
//!
//! Captures host input callbacks into an append-only JSON log and replays
//! it through a host injector, either against the wall clock or synchronised
//! to the host's own frame counter.
//!
//! ## Modes
//!
//! - **Continuous**: timestamped events, flushed to disk in the background,
//!   replayed on a dedicated thread
//! - **Frame**: pressed state sampled once per host frame, replayed by
//!   rebasing the host's frame ids onto the recorded ones

pub mod codec;
pub mod events;
pub mod recorder;
pub mod replay;
pub mod storage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use events::*;

pub use recorder::{InputRecorder, Receiver, RecordingStopped};
pub use replay::{InputPlayer, PlaybackStopped, ReplayStats};
pub use storage::{EventLogWriter, RecordingStorage};

pub mod prelude {
    pub use crate::events::*;
    pub use crate::recorder::{InputRecorder, RecordingStopped};
    pub use crate::replay::{InputPlayer, PlaybackStopped, ReplayStats};
    pub use crate::storage::RecordingStorage;
}
