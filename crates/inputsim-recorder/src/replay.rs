//! Input playback through a host injector
//!
//! Continuous playback runs on its own thread and follows the recorded
//! timestamps against a pausable stopwatch. Discontinuous playback is driven
//! by the host calling [`InputPlayer::play_frame_inputs`] once per frame.

use crate::codec;
use crate::events::{InputEvent, RecordingMode};
use crate::storage;
use crossbeam_channel::{unbounded, Receiver, Sender};
use inputsim_core::{
    Clock, Error, InputInjector, PlayerConfig, Result, Stopwatch, SystemClock,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Raised once per playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStopped {
    /// Every loaded event was dispatched
    Finished,
    /// `stop()` ended playback early
    Stopped,
}

/// Dispatch counters for the current run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub keys: usize,
    pub moves: usize,
    pub buttons: usize,
    /// Injector calls that returned an error
    pub failed: usize,
}

/// Replays a loaded event log
pub struct InputPlayer {
    config: PlayerConfig,
    shared: Arc<Shared>,
    session: Mutex<Session>,
}

struct Session {
    events: Arc<[InputEvent]>,
    log_mode: Option<RecordingMode>,
    active: Option<RecordingMode>,
    pending: VecDeque<InputEvent>,
    /// (first given frame, first recorded frame)
    frame_base: Option<(i64, i64)>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            events: Arc::from(Vec::new()),
            log_mode: None,
            active: None,
            pending: VecDeque::new(),
            frame_base: None,
            thread: None,
        }
    }
}

impl Session {
    fn rewind(&mut self) {
        self.pending.clear();
        self.frame_base = None;
        self.active = None;
    }
}

struct Shared {
    injector: Box<dyn InputInjector>,
    playing: AtomicBool,
    stop: AtomicBool,
    rewind: AtomicBool,
    stopwatch: Mutex<Stopwatch>,
    stats: Mutex<ReplayStats>,
    listeners: Mutex<Vec<Sender<PlaybackStopped>>>,
}

impl InputPlayer {
    pub fn new(config: PlayerConfig, injector: impl InputInjector + 'static) -> Self {
        Self::with_clock(config, injector, SystemClock::shared())
    }

    pub fn with_clock(config: PlayerConfig, injector: impl InputInjector + 'static, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                injector: Box::new(injector),
                playing: AtomicBool::new(false),
                stop: AtomicBool::new(false),
                rewind: AtomicBool::new(false),
                stopwatch: Mutex::new(Stopwatch::start(clock)),
                stats: Mutex::new(ReplayStats::default()),
                listeners: Mutex::new(Vec::new()),
            }),
            session: Mutex::new(Session::default()),
        }
    }

    /// Replace the loaded session with the log at `path`.
    ///
    /// Any running playback is stopped first. On failure the error is logged
    /// and the player is left with no events.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        match storage::load_file(path) {
            Ok(events) => self.load_events(events),
            Err(e) => {
                self.unload();
                error!(path = %path.display(), "Could not load input log: {}", e);
                Err(e)
            }
        }
    }

    /// Replace the loaded session with in-memory events.
    pub fn load_events(&self, events: Vec<InputEvent>) -> Result<usize> {
        self.unload();
        let log_mode = codec::validate_log(&events)
            .inspect_err(|e| error!("Rejected input log: {}", e))?;

        let count = events.len();
        let mut session = self.session.lock();
        session.events = events.into();
        session.log_mode = log_mode;
        info!(events = count, mode = ?log_mode, "Input log loaded");
        Ok(count)
    }

    fn unload(&self) {
        if self.is_playing() {
            self.stop();
        }
        let mut session = self.session.lock();
        session.rewind();
        session.events = Arc::from(Vec::new());
        session.log_mode = None;
    }

    pub fn event_count(&self) -> usize {
        self.session.lock().events.len()
    }

    /// Mode the loaded log was recorded in
    pub fn log_mode(&self) -> Option<RecordingMode> {
        self.session.lock().log_mode
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.is_playing() && self.shared.stopwatch.lock().is_paused()
    }

    /// Active playback mode, if playing
    pub fn playback_mode(&self) -> Option<RecordingMode> {
        if self.is_playing() {
            self.session.lock().active
        } else {
            None
        }
    }

    pub fn stats(&self) -> ReplayStats {
        *self.shared.stats.lock()
    }

    /// Receive a notification each time playback ends
    pub fn subscribe_stopped(&self) -> Receiver<PlaybackStopped> {
        let (tx, rx) = unbounded();
        self.shared.listeners.lock().push(tx);
        rx
    }

    /// Replay the log against the wall clock on a background thread.
    pub fn start_continuous_playback(&self) -> Result<()> {
        let mut session = self.session.lock();
        self.check_can_start(&session)?;
        reap(&mut session);

        self.shared.begin_run();
        let shared = Arc::clone(&self.shared);
        let events = Arc::clone(&session.events);
        let config = self.config.clone();
        let handle = thread::Builder::new()
            .name("inputsim-playback".into())
            .spawn(move || run_playback_loop(shared, events, config));

        match handle {
            Ok(handle) => {
                session.thread = Some(handle);
                session.active = Some(RecordingMode::Continuous);
                info!(events = session.events.len(), "Continuous playback started");
                Ok(())
            }
            Err(e) => {
                self.shared.playing.store(false, Ordering::Release);
                error!("Could not start playback thread: {}", e);
                Err(e.into())
            }
        }
    }

    /// Arm frame driven playback; events are dispatched by `play_frame_inputs`.
    pub fn start_discontinuous_playback(&self) -> Result<()> {
        let mut session = self.session.lock();
        self.check_can_start(&session)?;
        if session.log_mode != Some(RecordingMode::Frame) {
            let e = Error::mode_mismatch("Loaded input log has no frame ids");
            error!("Discontinuous playback did not start: {}", e);
            return Err(e);
        }
        reap(&mut session);

        self.shared.begin_run();
        session.pending = session.events.iter().cloned().collect();
        session.frame_base = None;
        session.active = Some(RecordingMode::Frame);
        info!(events = session.events.len(), "Discontinuous playback started");
        Ok(())
    }

    fn check_can_start(&self, session: &Session) -> Result<()> {
        if self.is_playing() {
            warn!("Input playback already running; start ignored");
            return Err(Error::redundant_start("Input playback"));
        }
        if session.events.is_empty() {
            let e = Error::nothing_to_play();
            error!("Input playback did not start: {}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Dispatch the events recorded on the frame matching `frame_id`.
    ///
    /// The first call pins `frame_id` to the log's first recorded frame;
    /// later ids are rebased by the same offset. Ids may arrive out of
    /// order: events of a frame stay pending until that frame is played.
    /// Playback finishes once nothing is pending or the rebased frame has
    /// passed the last recorded one. Returns the number of events dispatched.
    pub fn play_frame_inputs(&self, frame_id: i64) -> usize {
        let mut session = self.session.lock();
        if !self.is_playing() || session.active != Some(RecordingMode::Frame) {
            return 0;
        }

        let (Some(first_recorded), Some(last_recorded)) = (
            session.events.first().and_then(InputEvent::frame_id),
            session.events.last().and_then(InputEvent::frame_id),
        ) else {
            return 0;
        };
        let (first_given, first_recorded) = *session.frame_base.get_or_insert((frame_id, first_recorded));
        let Some(relative) = frame_id
            .checked_sub(first_given)
            .and_then(|offset| offset.checked_add(first_recorded))
        else {
            debug!(frame_id, "Frame id out of range of the recorded frames");
            return 0;
        };

        // Pending events keep the log's non-decreasing frame order
        let start = session.pending.partition_point(|e| frame_of(e) < relative);
        let end = session.pending.partition_point(|e| frame_of(e) <= relative);
        let due: Vec<InputEvent> = session.pending.drain(start..end).collect();
        for event in &due {
            self.shared.dispatch(event);
        }

        if session.pending.is_empty() || relative > last_recorded {
            if !session.pending.is_empty() {
                debug!(
                    unplayed = session.pending.len(),
                    "Playback passed the last recorded frame"
                );
            }
            session.rewind();
            if self.shared.playing.swap(false, Ordering::AcqRel) {
                info!("Discontinuous playback finished");
                self.shared.notify(PlaybackStopped::Finished);
            }
        }
        due.len()
    }

    /// Freeze continuous playback. Returns false if there is nothing to pause.
    pub fn pause(&self) -> bool {
        if self.playback_mode() != Some(RecordingMode::Continuous) {
            warn!("Pause ignored: no continuous playback running");
            return false;
        }
        self.shared.stopwatch.lock().pause();
        debug!("Playback paused");
        true
    }

    pub fn resume(&self) -> bool {
        if self.playback_mode() != Some(RecordingMode::Continuous) {
            warn!("Resume ignored: no continuous playback running");
            return false;
        }
        self.shared.stopwatch.lock().resume();
        debug!("Playback resumed");
        true
    }

    /// Rewind the running playback to the first loaded event.
    pub fn reset(&self) {
        let mut session = self.session.lock();
        match session.active {
            Some(RecordingMode::Continuous) if self.is_playing() => {
                self.shared.rewind.store(true, Ordering::Release);
            }
            Some(RecordingMode::Frame) if self.is_playing() => {
                session.pending = session.events.iter().cloned().collect();
                session.frame_base = None;
            }
            _ => session.rewind(),
        }
        debug!("Playback reset");
    }

    /// End playback, blocking until the playback thread has exited.
    ///
    /// Returns false (and logs a warning) when nothing was playing.
    pub fn stop(&self) -> bool {
        self.try_stop()
            .inspect_err(|e| warn!("{}; stop ignored", e.message))
            .is_ok()
    }

    /// Like [`stop`](Self::stop), but reports a redundant stop as
    /// `REDUNDANT_STOP`.
    pub fn try_stop(&self) -> Result<()> {
        let mut session = self.session.lock();
        let was_playing = self.shared.playing.swap(false, Ordering::AcqRel);
        self.shared.stop.store(true, Ordering::Release);
        reap(&mut session);
        session.rewind();
        self.shared.stop.store(false, Ordering::Release);
        self.shared.stopwatch.lock().resume();
        drop(session);

        if !was_playing {
            return Err(Error::redundant_stop("Input playback"));
        }
        info!("Input playback stopped");
        self.shared.notify(PlaybackStopped::Stopped);
        Ok(())
    }
}

impl Drop for InputPlayer {
    fn drop(&mut self) {
        if self.is_playing() {
            self.stop();
        } else {
            reap(self.session.get_mut());
        }
    }
}

fn frame_of(event: &InputEvent) -> i64 {
    event.frame_id().unwrap_or(i64::MIN)
}

/// Join a playback thread that has exited or was told to stop
fn reap(session: &mut Session) {
    if let Some(handle) = session.thread.take() {
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            error!("Playback thread panicked");
        }
    }
}

impl Shared {
    fn begin_run(&self) {
        self.stop.store(false, Ordering::Release);
        self.rewind.store(false, Ordering::Release);
        self.stopwatch.lock().restart();
        *self.stats.lock() = ReplayStats::default();
        self.playing.store(true, Ordering::Release);
    }

    fn dispatch(&self, event: &InputEvent) {
        let mut stats = self.stats.lock();
        let result = match event {
            InputEvent::Keyboard(k) => {
                stats.keys += 1;
                self.injector.key(&k.key, k.is_pressed)
            }
            InputEvent::Mouse(m) => {
                stats.moves += 1;
                self.injector.move_pointer(m.x, m.y).and_then(|()| match &m.button {
                    Some(button) => {
                        stats.buttons += 1;
                        self.injector.mouse_button(button, m.is_pressed)
                    }
                    None => Ok(()),
                })
            }
        };

        if let Err(e) = result {
            stats.failed += 1;
            error!(timestamp = event.timestamp(), "Input injection failed: {}", e);
        }
    }

    fn notify(&self, outcome: PlaybackStopped) {
        self.listeners.lock().retain(|tx| tx.send(outcome).is_ok());
    }
}

fn run_playback_loop(shared: Arc<Shared>, events: Arc<[InputEvent]>, config: PlayerConfig) {
    let Some(origin) = events.first().map(InputEvent::timestamp) else {
        return;
    };
    let mut cursor = 0;

    while cursor < events.len() {
        if shared.stop.load(Ordering::Acquire) {
            debug!(cursor, "Playback loop stopping");
            return;
        }

        if shared.rewind.swap(false, Ordering::AcqRel) {
            let mut stopwatch = shared.stopwatch.lock();
            let paused = stopwatch.is_paused();
            stopwatch.restart();
            if paused {
                stopwatch.pause();
            }
            cursor = 0;
            continue;
        }

        let (paused, elapsed) = {
            let stopwatch = shared.stopwatch.lock();
            (stopwatch.is_paused(), stopwatch.elapsed_ms())
        };
        if paused {
            thread::sleep(config.pause_poll());
            continue;
        }

        let due = events[cursor].timestamp().saturating_sub(origin);
        if elapsed < due {
            thread::sleep(config.sleep_step(due - elapsed));
            continue;
        }

        shared.dispatch(&events[cursor]);
        cursor += 1;
    }

    if shared.playing.swap(false, Ordering::AcqRel) {
        info!(events = events.len(), "Continuous playback finished");
        shared.notify(PlaybackStopped::Finished);
    }
}
