//! Input recorder - hook callbacks to an append-only event log
//!
//! Two modes, fixed at start:
//!
//! - **Continuous**: every callback is timestamped and queued immediately;
//!   a background thread flushes the queue to disk on a timer.
//! - **Frame**: callbacks only update the pressed state; the host samples it
//!   once per frame with [`InputRecorder::record_frame_inputs`].

use crate::events::{InputEvent, KeyboardEvent, MouseEvent, RecordingMode};
use crate::storage::{EventLogWriter, RecordingStorage};
pub use crossbeam_channel::Receiver;
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use inputsim_core::{
    Clock, Error, HookSink, InputHook, RawInput, RecorderConfig, Result, Stopwatch, SystemClock,
};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Raised once per finished recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingStopped {
    pub path: PathBuf,
    pub mode: RecordingMode,
    pub events_written: usize,
}

/// The recorder. Share it behind an `Arc` to stop from another thread.
pub struct InputRecorder {
    config: RecorderConfig,
    hook: Mutex<Box<dyn InputHook>>,
    live: Arc<LiveState>,
    session: Mutex<Option<Session>>,
    listeners: Mutex<Vec<Sender<RecordingStopped>>>,
}

struct Session {
    path: PathBuf,
    mode: RecordingMode,
    writer: Arc<Mutex<EventLogWriter>>,
    flusher: Option<Flusher>,
}

struct Flusher {
    stop_tx: Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl InputRecorder {
    pub fn new(config: RecorderConfig, hook: impl InputHook + 'static) -> Self {
        Self::with_clock(config, hook, SystemClock::shared())
    }

    pub fn with_clock(config: RecorderConfig, hook: impl InputHook + 'static, clock: Arc<dyn Clock>) -> Self {
        if let Some(dir) = &config.output_dir {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!(dir = %dir.display(), "Could not create input recordings directory: {}", e);
            }
        }

        let (queue_tx, queue_rx) = unbounded();
        let live = Arc::new(LiveState {
            recording: AtomicBool::new(false),
            continuous: AtomicBool::new(false),
            min_move_interval_ms: config.mouse_move_min_interval_ms as i64,
            queue_tx,
            queue_rx,
            state: Mutex::new(PressState::new(Stopwatch::start(clock))),
        });

        Self {
            config,
            hook: Mutex::new(Box::new(hook)),
            live,
            session: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.live.recording.load(Ordering::Acquire)
    }

    /// Directory recordings are written to
    pub fn files_directory(&self) -> Option<&Path> {
        self.config.output_dir.as_deref()
    }

    /// File of the active recording
    pub fn current_file(&self) -> Option<PathBuf> {
        self.session.lock().as_ref().map(|s| s.path.clone())
    }

    pub fn mode(&self) -> Option<RecordingMode> {
        self.session.lock().as_ref().map(|s| s.mode)
    }

    /// Receive a notification each time a recording stops
    pub fn subscribe_stopped(&self) -> Receiver<RecordingStopped> {
        let (tx, rx) = unbounded();
        self.listeners.lock().push(tx);
        rx
    }

    /// Start a recording into `<output_dir>/<file_name>.json`.
    ///
    /// An empty or missing name generates a timestamped one. Fails if a
    /// recording is already running, the output directory is not
    /// configured, the file cannot be created, or the hook refuses the
    /// subscription.
    pub fn start_recording(&self, file_name: Option<&str>, continuous: bool) -> Result<PathBuf> {
        let mut session = self.session.lock();
        if session.is_some() {
            warn!("Input recording already running; start ignored");
            return Err(Error::redundant_start("Input recording"));
        }

        let dir = self
            .config
            .require_output_dir()
            .inspect_err(|e| error!("Input recording did not start: {}", e))?;
        let storage = RecordingStorage::with_dir(dir)
            .inspect_err(|e| error!("Input recording did not start: {}", e))?;

        let mode = RecordingMode::from_continuous(continuous);
        let path = storage.new_recording_path(file_name, mode);

        self.live.reset(continuous);
        let writer = EventLogWriter::create(&path)
            .inspect_err(|e| error!(path = %path.display(), "Could not create input log: {}", e))?;

        let writer = Arc::new(Mutex::new(writer));
        let flusher = if continuous {
            match spawn_flusher(
                self.live.queue_rx.clone(),
                Arc::clone(&writer),
                self.config.flush_interval(),
            ) {
                Ok(f) => Some(f),
                Err(e) => {
                    error!("Could not start input flush thread: {}", e);
                    self.abandon(&path, writer, None);
                    return Err(e);
                }
            }
        } else {
            None
        };

        self.live.recording.store(true, Ordering::Release);
        let sink: HookSink = {
            let live = Arc::clone(&self.live);
            Arc::new(move |input| live.handle(input))
        };
        if let Err(e) = self.hook.lock().subscribe(sink) {
            self.live.recording.store(false, Ordering::Release);
            error!("Input hook subscription failed: {}", e);
            self.abandon(&path, writer, flusher);
            return Err(Error::hook_subscription(e.message));
        }

        info!(path = %path.display(), ?mode, "Input recording started");
        *session = Some(Session {
            path: path.clone(),
            mode,
            writer,
            flusher,
        });
        Ok(path)
    }

    /// Tear down a start that failed after the log file was created.
    fn abandon(&self, path: &Path, writer: Arc<Mutex<EventLogWriter>>, flusher: Option<Flusher>) {
        if let Some(flusher) = flusher {
            flusher.shutdown();
        }
        drop(writer);
        let dropped = self.live.queue_rx.try_iter().count();
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), "Could not remove abandoned input log: {}", e);
        }
        debug!(dropped, "Abandoned input recording start");
    }

    /// Stop the active recording and finalize its file.
    ///
    /// Blocks until the flush thread has exited. Returns `None` (and logs a
    /// warning) when nothing was recording.
    pub fn stop_recording(&self) -> Option<RecordingStopped> {
        self.try_stop_recording()
            .inspect_err(|e| warn!("{}; stop ignored", e.message))
            .ok()
    }

    /// Like [`stop_recording`](Self::stop_recording), but reports a
    /// redundant stop as `REDUNDANT_STOP`.
    pub fn try_stop_recording(&self) -> Result<RecordingStopped> {
        let mut guard = self.session.lock();
        let Some(session) = guard.take() else {
            return Err(Error::redundant_stop("Input recording"));
        };

        self.live.recording.store(false, Ordering::Release);
        self.hook.lock().unsubscribe();
        // Wait out any callback that passed the recording check before the store
        drop(self.live.state.lock());

        if let Some(flusher) = session.flusher {
            flusher.shutdown();
        }

        flush_queue(&self.live.queue_rx, &session.writer);
        let events_written = {
            let mut writer = session.writer.lock();
            if let Err(e) = writer.finish() {
                error!(path = %session.path.display(), "Could not finalize input log: {}", e);
            }
            writer.events_written()
        };
        drop(guard);

        let notice = RecordingStopped {
            path: session.path,
            mode: session.mode,
            events_written,
        };
        self.listeners
            .lock()
            .retain(|tx| tx.send(notice.clone()).is_ok());

        info!(events = events_written, "Input recording stopped");
        Ok(notice)
    }

    /// Sample the pressed state for one host frame.
    ///
    /// Queues one event per pressed key, one per pressed button and one
    /// pointer event, all stamped with `frame_id`. No-op unless a frame
    /// mode recording is running.
    pub fn record_frame_inputs(&self, frame_id: i64) {
        let state = self.live.state.lock();
        if !self.live.recording.load(Ordering::Acquire) || self.live.continuous.load(Ordering::Acquire) {
            return;
        }

        let now = state.stopwatch.elapsed_ms();
        let (x, y) = state.last_pointer;
        for key in &state.pressed_keys {
            self.live
                .enqueue(KeyboardEvent::new(now, key.clone(), true).at_frame(frame_id).into());
        }
        for button in &state.pressed_buttons {
            self.live
                .enqueue(MouseEvent::button(now, button.clone(), x, y, true).at_frame(frame_id).into());
        }
        self.live
            .enqueue(MouseEvent::movement(now, x, y).at_frame(frame_id).into());
    }

    /// Drop queued events and forget the pressed state
    pub fn clear(&self) {
        let mut state = self.live.state.lock();
        state.pressed_keys.clear();
        state.pressed_buttons.clear();
        state.last_move_ms = None;
        let dropped = self.live.queue_rx.try_iter().count();
        debug!(dropped, "Input recorder cleared");
    }

    pub fn pressed_keys(&self) -> Vec<String> {
        self.live.state.lock().pressed_keys.iter().cloned().collect()
    }

    pub fn pressed_mouse_buttons(&self) -> Vec<String> {
        self.live.state.lock().pressed_buttons.iter().cloned().collect()
    }

    /// Events captured but not yet written
    pub fn pending_events(&self) -> usize {
        self.live.queue_rx.len()
    }
}

impl Drop for InputRecorder {
    fn drop(&mut self) {
        if self.session.get_mut().is_some() {
            self.stop_recording();
        }
    }
}

// ============================================================================
// Hook side
// ============================================================================

struct LiveState {
    recording: AtomicBool,
    continuous: AtomicBool,
    min_move_interval_ms: i64,
    queue_tx: Sender<InputEvent>,
    queue_rx: Receiver<InputEvent>,
    state: Mutex<PressState>,
}

struct PressState {
    stopwatch: Stopwatch,
    pressed_keys: BTreeSet<String>,
    pressed_buttons: BTreeSet<String>,
    last_pointer: (i16, i16),
    last_move_ms: Option<i64>,
}

impl PressState {
    fn new(stopwatch: Stopwatch) -> Self {
        Self {
            stopwatch,
            pressed_keys: BTreeSet::new(),
            pressed_buttons: BTreeSet::new(),
            last_pointer: (0, 0),
            last_move_ms: None,
        }
    }
}

impl LiveState {
    fn reset(&self, continuous: bool) {
        let mut state = self.state.lock();
        state.stopwatch.restart();
        state.pressed_keys.clear();
        state.pressed_buttons.clear();
        state.last_move_ms = None;
        self.queue_rx.try_iter().for_each(drop);
        self.continuous.store(continuous, Ordering::Release);
    }

    fn capturing(&self) -> bool {
        self.recording.load(Ordering::Acquire) && self.continuous.load(Ordering::Acquire)
    }

    // Timestamps are taken and queued under the state lock, so queue order
    // is timestamp order even with concurrent callbacks.
    fn handle(&self, input: RawInput) {
        let mut state = self.state.lock();
        match input {
            RawInput::KeyPressed { key } => self.on_key(&mut state, key, true),
            RawInput::KeyReleased { key } => self.on_key(&mut state, key, false),
            RawInput::MousePressed { button, x, y } => self.on_button(&mut state, button, x, y, true),
            RawInput::MouseReleased { button, x, y } => self.on_button(&mut state, button, x, y, false),
            RawInput::MouseMoved { x, y } => self.on_move(&mut state, x, y),
        }
    }

    fn on_key(&self, state: &mut PressState, key: String, is_pressed: bool) {
        if is_pressed {
            state.pressed_keys.insert(key.clone());
        } else {
            state.pressed_keys.remove(&key);
        }

        if self.capturing() {
            let t = state.stopwatch.elapsed_ms();
            self.enqueue(KeyboardEvent::new(t, key, is_pressed).into());
        }
    }

    fn on_button(&self, state: &mut PressState, button: String, x: i16, y: i16, is_pressed: bool) {
        if is_pressed {
            state.pressed_buttons.insert(button.clone());
        } else {
            state.pressed_buttons.remove(&button);
        }
        state.last_pointer = (x, y);

        if self.capturing() {
            let t = state.stopwatch.elapsed_ms();
            self.enqueue(MouseEvent::button(t, button, x, y, is_pressed).into());
        }
    }

    fn on_move(&self, state: &mut PressState, x: i16, y: i16) {
        state.last_pointer = (x, y);
        if !self.capturing() {
            return;
        }

        let t = state.stopwatch.elapsed_ms();
        if let Some(last) = state.last_move_ms {
            if t - last < self.min_move_interval_ms {
                return;
            }
        }
        state.last_move_ms = Some(t);
        self.enqueue(MouseEvent::movement(t, x, y).into());
    }

    fn enqueue(&self, event: InputEvent) {
        // Both channel ends live in self, the send cannot fail
        let _ = self.queue_tx.send(event);
    }
}

// ============================================================================
// Flush thread
// ============================================================================

fn spawn_flusher(
    queue: Receiver<InputEvent>,
    writer: Arc<Mutex<EventLogWriter>>,
    interval: Duration,
) -> Result<Flusher> {
    let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
    let handle = thread::Builder::new()
        .name("inputsim-flush".into())
        .spawn(move || run_flush_loop(stop_rx, queue, writer, interval))?;
    Ok(Flusher { stop_tx, handle })
}

impl Flusher {
    fn shutdown(self) {
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            error!("Input flush thread panicked");
        }
    }
}

fn run_flush_loop(
    stop_rx: Receiver<()>,
    queue: Receiver<InputEvent>,
    writer: Arc<Mutex<EventLogWriter>>,
    interval: Duration,
) {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                flush_queue(&queue, &writer);
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Drain the queue into the log under the file lock.
///
/// On a write error the drained events are lost; they are not re-queued.
fn flush_queue(queue: &Receiver<InputEvent>, writer: &Mutex<EventLogWriter>) -> usize {
    let mut writer = writer.lock();
    let batch: Vec<InputEvent> = queue.try_iter().collect();
    if batch.is_empty() {
        return 0;
    }

    match writer.append(&batch) {
        Ok(n) => {
            debug!(events = n, "Flushed input events");
            n
        }
        Err(e) => {
            error!(
                path = %writer.path().display(),
                lost = batch.len(),
                "Failed to write input events: {}",
                e
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DeviceType;
    use crate::storage::load_file;
    use crate::testing::{wait_until, FakeHook};
    use inputsim_core::{ErrorCode, MockClock};
    use proptest::prelude::*;

    struct Rig {
        _dir: tempfile::TempDir,
        hook: FakeHook,
        clock: Arc<MockClock>,
        recorder: InputRecorder,
    }

    fn rig_with(flush_interval_ms: u64) -> Rig {
        let dir = tempfile::tempdir().unwrap();
        let config = RecorderConfig {
            flush_interval_ms,
            ..RecorderConfig::default().with_output_dir(dir.path())
        };
        let hook = FakeHook::new();
        let clock = Arc::new(MockClock::new());
        let recorder = InputRecorder::with_clock(config, hook.clone(), clock.clone());
        Rig {
            _dir: dir,
            hook,
            clock,
            recorder,
        }
    }

    fn rig() -> Rig {
        rig_with(60_000)
    }

    #[test]
    fn test_continuous_key_press_release() {
        let rig = rig();
        rig.clock.set(1_000);
        let path = rig.recorder.start_recording(Some("t1"), true).unwrap();
        assert!(path.ends_with("t1.json"));
        assert!(rig.recorder.is_recording());
        assert!(rig.hook.is_subscribed());

        rig.hook.emit(RawInput::key_pressed("A"));
        rig.clock.advance(50);
        rig.hook.emit(RawInput::key_released("A"));

        let stopped = rig.recorder.stop_recording().unwrap();
        assert_eq!(stopped.path, path);
        assert_eq!(stopped.events_written, 2);
        assert!(!rig.recorder.is_recording());
        assert!(!rig.hook.is_subscribed());

        let events = load_file(&path).unwrap();
        assert_eq!(
            events,
            vec![
                InputEvent::from(KeyboardEvent::new(0, "A", true)),
                InputEvent::from(KeyboardEvent::new(50, "A", false)),
            ]
        );
    }

    #[test]
    fn test_mouse_moves_are_rate_limited() {
        let rig = rig();
        rig.recorder.start_recording(Some("moves"), true).unwrap();

        rig.hook.emit(RawInput::mouse_moved(1, 1));
        rig.clock.advance(10);
        rig.hook.emit(RawInput::mouse_moved(2, 2));
        assert_eq!(rig.recorder.pending_events(), 1);

        rig.clock.advance(6);
        rig.hook.emit(RawInput::mouse_moved(3, 3));
        assert_eq!(rig.recorder.pending_events(), 2);

        // Buttons are never rate limited
        rig.hook.emit(RawInput::mouse_pressed("Button1", 3, 3));
        rig.hook.emit(RawInput::mouse_released("Button1", 3, 3));
        assert_eq!(rig.recorder.pending_events(), 4);

        let stopped = rig.recorder.stop_recording().unwrap();
        let events = load_file(&stopped.path).unwrap();
        assert_eq!(events[0], MouseEvent::movement(0, 1, 1).into());
        assert_eq!(events[1], MouseEvent::movement(16, 3, 3).into());
        assert_eq!(events[2], MouseEvent::button(16, "Button1", 3, 3, true).into());
    }

    #[test]
    fn test_frame_mode_samples_pressed_state() {
        let rig = rig();
        rig.recorder.start_recording(Some("frames"), false).unwrap();

        rig.hook.emit(RawInput::key_pressed("VcW"));
        rig.hook.emit(RawInput::key_pressed("VcA"));
        rig.hook.emit(RawInput::mouse_pressed("Button1", 10, 20));
        rig.hook.emit(RawInput::mouse_moved(15, 25));
        assert_eq!(rig.recorder.pending_events(), 0);

        rig.clock.advance(16);
        rig.recorder.record_frame_inputs(7);
        rig.hook.emit(RawInput::key_released("VcW"));
        rig.hook.emit(RawInput::mouse_released("Button1", 15, 25));
        rig.clock.advance(16);
        rig.recorder.record_frame_inputs(8);

        let stopped = rig.recorder.stop_recording().unwrap();
        assert_eq!(stopped.mode, RecordingMode::Frame);
        let events = load_file(&stopped.path).unwrap();
        assert_eq!(
            events,
            vec![
                KeyboardEvent::new(16, "VcA", true).at_frame(7).into(),
                KeyboardEvent::new(16, "VcW", true).at_frame(7).into(),
                MouseEvent::button(16, "Button1", 15, 25, true).at_frame(7).into(),
                MouseEvent::movement(16, 15, 25).at_frame(7).into(),
                KeyboardEvent::new(32, "VcA", true).at_frame(8).into(),
                MouseEvent::movement(32, 15, 25).at_frame(8).into(),
            ]
        );
    }

    #[test]
    fn test_frame_inputs_ignored_in_continuous_mode_or_idle() {
        let rig = rig();
        rig.recorder.record_frame_inputs(1);
        assert_eq!(rig.recorder.pending_events(), 0);

        rig.recorder.start_recording(Some("cont"), true).unwrap();
        rig.recorder.record_frame_inputs(1);
        assert_eq!(rig.recorder.pending_events(), 0);
        rig.recorder.stop_recording();
    }

    #[test]
    fn test_pressed_state_tracking() {
        let rig = rig();
        rig.recorder.start_recording(None, false).unwrap();
        rig.hook.emit(RawInput::key_pressed("VcShift"));
        rig.hook.emit(RawInput::key_pressed("VcA"));
        rig.hook.emit(RawInput::mouse_pressed("Button2", 0, 0));
        rig.hook.emit(RawInput::key_released("VcShift"));

        assert_eq!(rig.recorder.pressed_keys(), vec!["VcA".to_string()]);
        assert_eq!(rig.recorder.pressed_mouse_buttons(), vec!["Button2".to_string()]);

        rig.recorder.clear();
        assert!(rig.recorder.pressed_keys().is_empty());
        assert!(rig.recorder.pressed_mouse_buttons().is_empty());
        rig.recorder.stop_recording();
    }

    #[test]
    fn test_default_file_name_by_mode() {
        let rig = rig();
        let path = rig.recorder.start_recording(None, false).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("Disc-input_recording_"), "{}", name);
        rig.recorder.stop_recording();

        let path = rig.recorder.start_recording(Some(""), true).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("Cont-input_recording_"), "{}", name);
        rig.recorder.stop_recording();
    }

    #[test]
    fn test_redundant_start_is_rejected() {
        let rig = rig();
        let first = rig.recorder.start_recording(Some("one"), true).unwrap();
        let err = rig.recorder.start_recording(Some("two"), true).unwrap_err();
        assert!(err.is(ErrorCode::RedundantStart));
        assert_eq!(rig.recorder.current_file(), Some(first));
        assert_eq!(rig.hook.subscriptions(), 1);
        rig.recorder.stop_recording();
    }

    #[test]
    fn test_stop_twice_finalizes_once() {
        let rig = rig();
        let rx = rig.recorder.subscribe_stopped();
        rig.recorder.start_recording(Some("twice"), true).unwrap();
        rig.hook.emit(RawInput::key_pressed("VcA"));

        assert!(rig.recorder.stop_recording().is_some());
        assert!(rig.recorder.stop_recording().is_none());

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());

        let path = rig.recorder.files_directory().unwrap().join("twice.json");
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.matches(']').count(), 1);
    }

    #[test]
    fn test_missing_output_dir() {
        let hook = FakeHook::new();
        let recorder = InputRecorder::new(RecorderConfig::default(), hook.clone());
        let err = recorder.start_recording(Some("x"), true).unwrap_err();
        assert!(err.is(ErrorCode::ConfigMissing));
        assert!(!recorder.is_recording());
        assert!(!hook.is_subscribed());
    }

    #[test]
    fn test_hook_failure_aborts_start() {
        let rig = rig();
        rig.hook.fail_subscribe(true);
        let err = rig.recorder.start_recording(Some("nohook"), true).unwrap_err();
        assert!(err.is(ErrorCode::HookSubscriptionFailed));
        assert!(!rig.recorder.is_recording());
        assert!(rig.recorder.current_file().is_none());
        assert!(!rig.recorder.files_directory().unwrap().join("nohook.json").exists());

        rig.hook.fail_subscribe(false);
        assert!(rig.recorder.start_recording(Some("nohook"), true).is_ok());
        rig.recorder.stop_recording();
    }

    #[test]
    fn test_failed_start_joins_flusher_and_removes_log() {
        let rig = rig_with(5);
        rig.hook.fail_subscribe(true);
        let path = rig.recorder.files_directory().unwrap().join("aborted.json");

        for continuous in [true, false] {
            assert!(rig.recorder.start_recording(Some("aborted"), continuous).is_err());
            thread::sleep(Duration::from_millis(30));
            assert!(!path.exists());
            assert_eq!(rig.recorder.pending_events(), 0);
            assert!(rig.recorder.mode().is_none());
        }
    }

    #[test]
    fn test_try_stop_reports_redundant_stop() {
        let rig = rig();
        let err = rig.recorder.try_stop_recording().unwrap_err();
        assert!(err.is(ErrorCode::RedundantStop));

        rig.recorder.start_recording(Some("once"), false).unwrap();
        assert!(rig.recorder.try_stop_recording().is_ok());
        assert!(rig
            .recorder
            .try_stop_recording()
            .unwrap_err()
            .is(ErrorCode::RedundantStop));
    }

    #[test]
    fn test_flush_loop_writes_periodically() {
        let rig = rig_with(10);
        let path = rig.recorder.start_recording(Some("periodic"), true).unwrap();
        rig.hook.emit(RawInput::key_pressed("VcQ"));

        let flushed = wait_until(Duration::from_secs(5), || {
            std::fs::read_to_string(&path)
                .map(|t| t.contains("VcQ"))
                .unwrap_or(false)
        });
        assert!(flushed);
        assert_eq!(rig.recorder.pending_events(), 0);

        rig.clock.advance(5);
        rig.hook.emit(RawInput::key_released("VcQ"));
        let stopped = rig.recorder.stop_recording().unwrap();
        assert_eq!(stopped.events_written, 2);

        let events = load_file(&path).unwrap();
        assert!(events.iter().all(|e| e.device_type() == DeviceType::Keyboard));
        assert!(events.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    }

    #[test]
    fn test_restart_resets_session_clock() {
        let rig = rig();
        rig.recorder.start_recording(Some("a"), true).unwrap();
        rig.clock.advance(500);
        rig.recorder.stop_recording();

        let path = rig.recorder.start_recording(Some("b"), true).unwrap();
        rig.hook.emit(RawInput::key_pressed("VcB"));
        rig.recorder.stop_recording();
        assert_eq!(load_file(&path).unwrap()[0].timestamp(), 0);
    }

    #[test]
    fn test_concurrent_callbacks_keep_timestamps_ordered() {
        let rig = rig_with(5);
        let path = rig.recorder.start_recording(Some("threads"), true).unwrap();

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let hook = rig.hook.clone();
                let clock = rig.clock.clone();
                thread::spawn(move || {
                    for n in 0..50 {
                        clock.advance(1);
                        hook.emit(RawInput::key_pressed(format!("K{}_{}", i, n)));
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let stopped = rig.recorder.stop_recording().unwrap();
        assert_eq!(stopped.events_written, 200);
        let events = load_file(&path).unwrap();
        assert_eq!(events.len(), 200);
        assert!(events.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    }

    #[test]
    fn test_drop_finalizes_active_recording() {
        let rig = rig();
        let path = rig.recorder.start_recording(Some("dropped"), true).unwrap();
        rig.hook.emit(RawInput::key_pressed("VcZ"));
        let Rig { _dir, recorder, .. } = rig;
        drop(recorder);

        assert_eq!(load_file(&path).unwrap().len(), 1);
    }

    fn arb_raw_input() -> impl Strategy<Value = RawInput> {
        let key = prop::sample::select(vec!["VcA", "VcB", "VcShift"]);
        let button = prop::sample::select(vec!["Button1", "Button2"]);
        prop_oneof![
            key.clone().prop_map(RawInput::key_pressed),
            key.prop_map(RawInput::key_released),
            (button.clone(), any::<i16>(), any::<i16>())
                .prop_map(|(b, x, y)| RawInput::mouse_pressed(b, x, y)),
            (button, any::<i16>(), any::<i16>())
                .prop_map(|(b, x, y)| RawInput::mouse_released(b, x, y)),
            (any::<i16>(), any::<i16>()).prop_map(|(x, y)| RawInput::mouse_moved(x, y)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn test_recorded_timestamps_never_decrease(
            continuous in any::<bool>(),
            steps in prop::collection::vec((0i64..40, arb_raw_input()), 1..80),
        ) {
            let rig = rig();
            let path = rig.recorder.start_recording(Some("sorted"), continuous).unwrap();
            for (frame, (advance, input)) in steps.into_iter().enumerate() {
                rig.clock.advance(advance);
                rig.hook.emit(input);
                rig.recorder.record_frame_inputs(frame as i64);
            }
            rig.recorder.stop_recording().unwrap();

            let events = load_file(&path).unwrap();
            prop_assert!(!events.is_empty());
            prop_assert!(events.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
            prop_assert!(events.windows(2).all(|w| w[0].frame_id() <= w[1].frame_id()));
        }
    }
}
