//! Ticker - a named, independently controllable virtual clock
//!
//! Each ticker accumulates scaled virtual time from the real deltas the
//! frame driver reports and dispatches that time to its registered items in
//! registration order. Sleep freezes the clock entirely; wake shifts the
//! start reference forward by the slept gap so virtual time continues
//! seamlessly with no forward jump.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use tempo_core::{
    compose_scales, floor_time_scale, CallbackId, TempoError, VirtualTime, STANDARD_FRAME_RATE,
};

use crate::driver::FrameDriver;

/// Per-item view of one dispatch
#[derive(Clone, Copy, Debug)]
pub struct TickEvent {
    /// Virtual time accumulated by this item since its registration
    pub item_time: VirtualTime,
    /// Scaled delta for this tick, in seconds
    pub delta_seconds: f64,
    /// Scaled delta expressed in 60 fps frame units
    pub delta_frames: f64,
    /// The ticker's own virtual time
    pub ticker_time: VirtualTime,
}

pub type TickerCallback = Arc<Mutex<dyn FnMut(&TickEvent) + Send>>;

/// One registered callback slot. Tombstoned on remove (active = false) and
/// physically purged only after a completed dispatch pass.
struct TickerItem {
    id: CallbackId,
    callback: TickerCallback,
    time: VirtualTime,
    active: bool,
}

struct TickerState {
    /// Real-time reference the elapsed computation is anchored to
    start_time: Duration,
    /// Elapsed real time observed by the previous update
    previous_real: Duration,
    virtual_time: VirtualTime,
    local_scale: f64,
    global_scale: f64,
    /// Scale to restore on wake
    before_sleep_scale: f64,
    /// Real time at which sleep (or the registry's store hook) began
    sleep_start: Duration,
    running: bool,
    /// Tombstones awaiting end-of-pass compaction
    dirty: bool,
    items: Vec<TickerItem>,
}

pub struct Ticker {
    name: String,
    auto_sleep: bool,
    driver: Weak<FrameDriver>,
    self_ref: Weak<Ticker>,
    state: Mutex<TickerState>,
}

impl Ticker {
    pub(crate) fn new(
        name: &str,
        driver: &Arc<FrameDriver>,
        auto_sleep: bool,
        global_scale: f64,
    ) -> Arc<Ticker> {
        let now = driver.now();
        Arc::new_cyclic(|self_ref| Ticker {
            name: name.to_string(),
            auto_sleep,
            driver: Arc::downgrade(driver),
            self_ref: self_ref.clone(),
            state: Mutex::new(TickerState {
                start_time: now,
                previous_real: Duration::ZERO,
                virtual_time: VirtualTime::ZERO,
                local_scale: 1.0,
                global_scale: floor_time_scale(global_scale),
                before_sleep_scale: 1.0,
                sleep_start: now,
                running: true,
                dirty: false,
                items: Vec::new(),
            }),
        })
    }

    /// Construct a ticker outside any registry. The caller is responsible
    /// for attaching it to the driver.
    pub fn standalone(
        name: &str,
        driver: &Arc<FrameDriver>,
        auto_sleep: bool,
        global_scale: f64,
    ) -> Arc<Ticker> {
        Self::new(name, driver, auto_sleep, global_scale)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current virtual time
    pub fn time(&self) -> VirtualTime {
        self.state.lock().virtual_time
    }

    /// Local time scale (the value that will apply while running)
    pub fn time_scale(&self) -> f64 {
        let s = self.state.lock();
        if s.running {
            s.local_scale
        } else {
            s.before_sleep_scale
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Number of registered, non-tombstoned items
    pub fn active_items(&self) -> usize {
        self.state.lock().items.iter().filter(|i| i.active).count()
    }

    /// Whether `id` is currently registered and active
    pub fn contains(&self, id: CallbackId) -> bool {
        self.state
            .lock()
            .items
            .iter()
            .any(|i| i.id == id && i.active)
    }

    /// Register a callback under `id` and return the ticker's current
    /// virtual time. Re-adding an active id keeps the existing slot and
    /// logs a diagnostic; re-adding a tombstoned id refreshes the slot in
    /// place. Adding to a sleeping auto-sleep ticker wakes it.
    pub fn add(
        &self,
        id: CallbackId,
        callback: impl FnMut(&TickEvent) + Send + 'static,
    ) -> VirtualTime {
        let (time, wake) = {
            let mut guard = self.state.lock();
            let s = &mut *guard;
            let time = s.virtual_time;
            match s.items.iter().position(|item| item.id == id) {
                Some(i) if s.items[i].active => {
                    tracing::warn!(
                        ticker = %self.name,
                        %id,
                        "callback already registered; keeping existing slot"
                    );
                    (time, false)
                }
                Some(i) => {
                    let item = &mut s.items[i];
                    item.callback = Arc::new(Mutex::new(callback));
                    item.time = VirtualTime::ZERO;
                    item.active = true;
                    (time, self.auto_sleep && !s.running)
                }
                None => {
                    s.items.push(TickerItem {
                        id,
                        callback: Arc::new(Mutex::new(callback)),
                        time: VirtualTime::ZERO,
                        active: true,
                    });
                    (time, self.auto_sleep && !s.running)
                }
            }
        };
        if wake {
            self.wake();
        }
        time
    }

    /// Tombstone one item; unknown ids are a silent no-op
    pub fn remove(&self, id: CallbackId) {
        let mut guard = self.state.lock();
        let s = &mut *guard;
        match s.items.iter_mut().find(|item| item.id == id && item.active) {
            Some(item) => {
                item.active = false;
                s.dirty = true;
            }
            None => {
                tracing::trace!(ticker = %self.name, %id, "remove of unregistered callback ignored")
            }
        }
    }

    /// Tombstone a batch of items
    pub fn remove_many(&self, ids: &[CallbackId]) {
        for &id in ids {
            self.remove(id);
        }
    }

    /// Tombstone every registered item
    pub fn remove_all(&self) {
        let mut guard = self.state.lock();
        let s = &mut *guard;
        for item in s.items.iter_mut() {
            if item.active {
                item.active = false;
                s.dirty = true;
            }
        }
    }

    /// Set the local time scale. Exactly 0 is the sleep sentinel and is
    /// treated as a sleep request; other values are floored to the minimum
    /// scale. While sleeping, the new value replaces the scale that wake
    /// will restore.
    pub fn set_time_scale(&self, scale: f64) {
        if scale == 0.0 {
            tracing::debug!(ticker = %self.name, "time scale 0 requested; treating as sleep");
            self.sleep();
            return;
        }
        let mut s = self.state.lock();
        let floored = floor_time_scale(scale);
        if s.running {
            s.local_scale = floored;
        } else {
            s.before_sleep_scale = floored;
        }
    }

    /// Set the broadcast global scale (floored, never a sleep request —
    /// the registry owns whole-domain freezing)
    pub fn set_global_time_scale(&self, scale: f64) {
        self.state.lock().global_scale = floor_time_scale(scale);
    }

    /// Freeze virtual time and detach from the driver. Idempotent.
    pub fn sleep(&self) {
        let driver = self.driver.upgrade();
        let now = self.real_now(driver.as_deref());
        {
            let mut guard = self.state.lock();
            let s = &mut *guard;
            if !s.running {
                return;
            }
            s.running = false;
            s.before_sleep_scale = floor_time_scale(s.local_scale);
            s.sleep_start = now;
        }
        if let Some(driver) = driver {
            driver.remove(self);
        }
    }

    /// Resume from sleep, shifting the start reference forward by the
    /// slept real-time gap so virtual time continues with no jump.
    /// Idempotent.
    pub fn wake(&self) {
        let driver = self.driver.upgrade();
        let now = self.real_now(driver.as_deref());
        {
            let mut guard = self.state.lock();
            let s = &mut *guard;
            if s.running {
                return;
            }
            s.start_time += now.saturating_sub(s.sleep_start);
            s.local_scale = s.before_sleep_scale;
            s.running = true;
        }
        if let Some(driver) = driver {
            if let Some(me) = self.self_ref.upgrade() {
                driver.add(&me);
            }
        }
    }

    /// Record the freeze point for a whole-domain pause (app backgrounding).
    /// Usable independently of sleep; a ticker already sleeping is skipped
    /// so its own sleep reference is not clobbered.
    pub fn store_time_before_sleep(&self) {
        let driver = self.driver.upgrade();
        let now = self.real_now(driver.as_deref());
        let mut s = self.state.lock();
        if !s.running {
            return;
        }
        s.sleep_start = now;
    }

    /// Discard the real-time gap since the matching store call
    pub fn restore_time_after_sleep(&self) {
        let driver = self.driver.upgrade();
        let now = self.real_now(driver.as_deref());
        let mut guard = self.state.lock();
        let s = &mut *guard;
        if !s.running {
            return;
        }
        s.start_time += now.saturating_sub(s.sleep_start);
        s.sleep_start = now;
    }

    /// One dispatch pass, invoked by the frame driver while running.
    ///
    /// The item snapshot is taken under the lock, then every callback runs
    /// with no lock held, so callbacks may re-enter add/remove/sleep.
    /// Tombstoned items are compacted only after the pass completes.
    pub fn update(&self, now: Duration) {
        let (snapshot, delta_seconds, ticker_time) = {
            let mut guard = self.state.lock();
            let s = &mut *guard;
            if !s.running {
                return;
            }
            let elapsed = now.saturating_sub(s.start_time);
            let raw = elapsed.saturating_sub(s.previous_real).as_secs_f64();
            s.previous_real = elapsed;
            let scaled = raw * compose_scales(s.local_scale, s.global_scale);
            s.virtual_time = s.virtual_time.saturating_add_secs_f64(scaled);
            let ticker_time = s.virtual_time;
            let mut snapshot = Vec::with_capacity(s.items.len());
            for item in s.items.iter_mut() {
                if !item.active {
                    continue;
                }
                item.time = item.time.saturating_add_secs_f64(scaled);
                snapshot.push((item.id, item.callback.clone(), item.time));
            }
            (snapshot, scaled, ticker_time)
        };

        for (id, callback, item_time) in snapshot {
            // Skip slots tombstoned or replaced earlier in this same pass.
            // The check is on slot identity, not just id: a remove + re-add
            // under the same id mid-pass must not run the removed callback.
            if !self.slot_live(id, &callback) {
                continue;
            }
            let event = TickEvent {
                item_time,
                delta_seconds,
                delta_frames: delta_seconds * STANDARD_FRAME_RATE,
                ticker_time,
            };
            (&mut *callback.lock())(&event);
        }

        let idle = {
            let mut guard = self.state.lock();
            let s = &mut *guard;
            if s.dirty {
                s.items.retain(|item| item.active);
                s.dirty = false;
            }
            s.running && self.auto_sleep && s.items.is_empty()
        };
        if idle {
            self.sleep();
        }
    }

    /// Whether the exact slot a snapshot entry was taken from is still
    /// registered and active
    fn slot_live(&self, id: CallbackId, callback: &TickerCallback) -> bool {
        self.state
            .lock()
            .items
            .iter()
            .any(|item| item.id == id && item.active && Arc::ptr_eq(&item.callback, callback))
    }

    fn real_now(&self, driver: Option<&FrameDriver>) -> Duration {
        match driver {
            Some(driver) => driver.now(),
            None => {
                tracing::error!(
                    ticker = %self.name,
                    "{}",
                    TempoError::DriverDetached(self.name.clone())
                );
                let s = self.state.lock();
                s.start_time + s.previous_real
            }
        }
    }
}
