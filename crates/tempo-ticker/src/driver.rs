//! Frame-driver boundary
//!
//! The driver is the external per-refresh callback source. This module owns
//! only the boundary: a monotonic clock trait and the attach/detach
//! registration pair tickers use to opt in and out of dispatch.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::ticker::Ticker;

/// Monotonic real-time source, elapsed since an arbitrary epoch
pub trait FrameClock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Production clock backed by `Instant`
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Settable clock for tests and simulation
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            now: Mutex::new(Duration::ZERO),
        }
    }

    pub fn set(&self, t: Duration) {
        *self.now.lock() = t;
    }

    pub fn advance(&self, dt: Duration) {
        *self.now.lock() += dt;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Frame driver - fires one tick per display refresh to attached tickers
///
/// Holds tickers weakly; a dropped ticker is pruned after the next tick.
/// Attach is idempotent and detach of an unattached ticker is a no-op.
pub struct FrameDriver {
    clock: Arc<dyn FrameClock>,
    attached: Mutex<Vec<Weak<Ticker>>>,
}

impl FrameDriver {
    pub fn new(clock: Arc<dyn FrameClock>) -> Arc<Self> {
        Arc::new(FrameDriver {
            clock,
            attached: Mutex::new(Vec::new()),
        })
    }

    /// Current monotonic elapsed time
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Attach a ticker; no-op if already attached
    pub fn add(&self, ticker: &Arc<Ticker>) {
        let mut attached = self.attached.lock();
        if attached
            .iter()
            .any(|w| std::ptr::eq(w.as_ptr(), Arc::as_ptr(ticker)))
        {
            return;
        }
        attached.push(Arc::downgrade(ticker));
    }

    /// Detach a ticker; no-op if not attached
    pub fn remove(&self, ticker: &Ticker) {
        self.attached
            .lock()
            .retain(|w| !std::ptr::eq(w.as_ptr(), ticker as *const Ticker));
    }

    /// One display refresh: update every attached ticker over a stable
    /// snapshot, so tickers attached or detached mid-tick do not disturb
    /// the in-progress pass.
    pub fn tick(&self) {
        let now = self.clock.now();
        let snapshot: Vec<Arc<Ticker>> = self
            .attached
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for ticker in snapshot {
            ticker.update(now);
        }
        self.attached.lock().retain(|w| w.strong_count() > 0);
    }

    /// Number of currently attached tickers
    pub fn attached(&self) -> usize {
        self.attached.lock().len()
    }
}
