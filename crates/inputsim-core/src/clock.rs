//! Time sources for recording and playback sessions.
//!
//! `SystemClock` backs real sessions, `MockClock` makes timing tests
//! deterministic. Both are read through a `Stopwatch`, which measures a
//! session and can exclude paused spans from the elapsed time.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Abstraction over monotonic time sources.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds from an arbitrary epoch.
    fn now_ms(&self) -> i64;
}

/// Wall clock backed by `Instant`.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn shared() -> Arc<dyn Clock> {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}

/// Manually driven clock for tests.
#[derive(Default)]
pub struct MockClock {
    current_ms: AtomicI64,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: i64) {
        self.current_ms.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.current_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> i64 {
        self.current_ms.load(Ordering::SeqCst)
    }
}

/// Session stopwatch over a shared clock.
pub struct Stopwatch {
    clock: Arc<dyn Clock>,
    started_at: i64,
    paused_at: Option<i64>,
    paused_total: i64,
}

impl Stopwatch {
    pub fn start(clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now_ms();
        Self {
            clock,
            started_at,
            paused_at: None,
            paused_total: 0,
        }
    }

    /// Milliseconds since start, not counting time spent paused.
    pub fn elapsed_ms(&self) -> i64 {
        let now = self.paused_at.unwrap_or_else(|| self.clock.now_ms());
        (now - self.started_at - self.paused_total).max(0)
    }

    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.clock.now_ms());
        }
    }

    pub fn resume(&mut self) {
        if let Some(at) = self.paused_at.take() {
            self.paused_total += self.clock.now_ms() - at;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Zero the stopwatch and clear any pause.
    pub fn restart(&mut self) {
        self.started_at = self.clock.now_ms();
        self.paused_at = None;
        self.paused_total = 0;
    }
}
