//! Test doubles for the host capabilities.
//!
//! `FakeHook` feeds synthetic callbacks into a recorder, `RecordingInjector`
//! captures what a player dispatches.

use inputsim_core::{Error, HookSink, InputHook, InputInjector, RawInput, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct HookState {
    sink: Option<HookSink>,
    fail_subscribe: bool,
    subscriptions: usize,
}

/// Hook driven by the test. Clones share state, so keep one and hand one
/// to the recorder.
#[derive(Clone, Default)]
pub struct FakeHook {
    state: Arc<Mutex<HookState>>,
}

impl FakeHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `subscribe` fail
    pub fn fail_subscribe(&self, fail: bool) {
        self.state.lock().fail_subscribe = fail;
    }

    /// Deliver input to the current subscriber. Returns false if nobody listens.
    pub fn emit(&self, input: RawInput) -> bool {
        let sink = self.state.lock().sink.clone();
        match sink {
            Some(sink) => {
                sink(input);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.lock().sink.is_some()
    }

    pub fn subscriptions(&self) -> usize {
        self.state.lock().subscriptions
    }
}

impl InputHook for FakeHook {
    fn subscribe(&mut self, sink: HookSink) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_subscribe {
            return Err(Error::hook_subscription("fake hook refused subscription"));
        }
        state.sink = Some(sink);
        state.subscriptions += 1;
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.state.lock().sink = None;
    }
}

/// One call made against an injector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    Key { key: String, is_pressed: bool },
    Move { x: i16, y: i16 },
    Button { button: String, is_pressed: bool },
}

/// Injector that records every call in order
#[derive(Clone, Default)]
pub struct RecordingInjector {
    calls: Arc<Mutex<Vec<Injection>>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Injection> {
        self.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl InputInjector for RecordingInjector {
    fn key(&self, key: &str, is_pressed: bool) -> Result<()> {
        self.calls.lock().push(Injection::Key {
            key: key.to_string(),
            is_pressed,
        });
        Ok(())
    }

    fn move_pointer(&self, x: i16, y: i16) -> Result<()> {
        self.calls.lock().push(Injection::Move { x, y });
        Ok(())
    }

    fn mouse_button(&self, button: &str, is_pressed: bool) -> Result<()> {
        self.calls.lock().push(Injection::Button {
            button: button.to_string(),
            is_pressed,
        });
        Ok(())
    }
}

/// Poll `cond` every millisecond until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}
