//! Delayed-call scheduler
//!
//! All entries live in the virtual-time domain of one dedicated ticker, so
//! they scale, freeze, and resume with the rest of the scheduling domain.
//! Entries are grouped by caller-held `CallbackId`: killing or pausing an
//! id affects every outstanding call scheduled under it.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use tempo_core::{CallbackId, TempoError, TempoResult};
use tempo_ticker::{Ticker, TickerRegistry};

/// Name of the shared ticker the scheduler drives its entries from
pub const DELAYED_TICKER: &str = "tempo:delayed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallState {
    Pending,
    Paused,
    Cancelled,
    Fired,
}

type DelayedCallback = Arc<Mutex<dyn FnMut() + Send>>;

struct DelayedEntry {
    id: CallbackId,
    callback: DelayedCallback,
    /// Scaled virtual seconds left before firing; progress survives pause
    remaining: f64,
    state: CallState,
    /// Dispatch pass the entry was created in; entries never advance or
    /// fire within their creation pass, so a zero delay still defers to
    /// the next tick
    created_pass: u64,
}

struct SchedulerState {
    entries: Vec<DelayedEntry>,
    pass: u64,
}

/// One-shot scheduler bound to the shared virtual-time domain
pub struct DelayedScheduler {
    ticker: Arc<Ticker>,
    tick_id: CallbackId,
    state: Arc<Mutex<SchedulerState>>,
}

impl DelayedScheduler {
    /// Acquire the shared delayed-call ticker from `registry` and start
    /// driving entries from it
    pub fn new(registry: &TickerRegistry) -> Self {
        let ticker = registry.get_ticker(DELAYED_TICKER, false);
        let state = Arc::new(Mutex::new(SchedulerState {
            entries: Vec::new(),
            pass: 0,
        }));
        let shared = state.clone();
        let tick_id = CallbackId::next();
        ticker.add(tick_id, move |event| {
            Self::advance(&shared, event.delta_seconds);
        });
        DelayedScheduler {
            ticker,
            tick_id,
            state,
        }
    }

    /// Schedule `callback` to fire once `delay_seconds` of scaled virtual
    /// time elapse. Several calls may share an id; they are then killed,
    /// paused, and resumed together.
    pub fn call(&self, id: CallbackId, callback: impl FnMut() + Send + 'static, delay_seconds: f64) {
        let delay = if delay_seconds.is_finite() && delay_seconds >= 0.0 {
            delay_seconds
        } else {
            tracing::warn!(%id, delay_seconds, "invalid delay; clamping to 0");
            0.0
        };
        let mut s = self.state.lock();
        let created_pass = s.pass;
        s.entries.push(DelayedEntry {
            id,
            callback: Arc::new(Mutex::new(callback)),
            remaining: delay,
            state: CallState::Pending,
            created_pass,
        });
    }

    /// Defer `callback` to the next tick (zero-delay call)
    pub fn next_tick(&self, id: CallbackId, callback: impl FnMut() + Send + 'static) {
        self.call(id, callback, 0.0);
    }

    /// Cancel every outstanding call scheduled under `id`; unknown ids are
    /// a silent no-op
    pub fn kill(&self, id: CallbackId) {
        let mut s = self.state.lock();
        let mut hits = 0usize;
        for entry in s.entries.iter_mut().filter(|e| e.id == id) {
            if matches!(entry.state, CallState::Pending | CallState::Paused) {
                entry.state = CallState::Cancelled;
                hits += 1;
            }
        }
        s.entries
            .retain(|e| !matches!(e.state, CallState::Cancelled));
        if hits == 0 {
            tracing::trace!(%id, "kill of unknown delayed call ignored");
        }
    }

    /// Cancel every outstanding call across all ids
    pub fn kill_all(&self) {
        self.state.lock().entries.clear();
    }

    /// Pause all pending calls for `id`, keeping elapsed progress
    pub fn pause(&self, id: CallbackId) {
        let mut s = self.state.lock();
        for entry in s.entries.iter_mut().filter(|e| e.id == id) {
            if entry.state == CallState::Pending {
                entry.state = CallState::Paused;
            }
        }
    }

    /// Resume all paused calls for `id`
    pub fn resume(&self, id: CallbackId) {
        let mut s = self.state.lock();
        for entry in s.entries.iter_mut().filter(|e| e.id == id) {
            if entry.state == CallState::Paused {
                entry.state = CallState::Pending;
            }
        }
    }

    /// Resolve after `delay_seconds` of scheduled virtual time, without
    /// blocking. Killing the underlying entry (or dropping the scheduler)
    /// resolves with `TempoError::WaitCancelled`.
    pub fn wait(&self, delay_seconds: f64) -> impl Future<Output = TempoResult<()>> {
        self.wait_as(CallbackId::next(), delay_seconds)
    }

    /// `wait` under a caller-held id, so the delay can be killed or paused
    /// like any other call.
    ///
    /// The entry is scheduled here, eagerly: the delay starts elapsing as
    /// soon as this returns, whether or not the future has been polled yet.
    pub fn wait_as(
        &self,
        id: CallbackId,
        delay_seconds: f64,
    ) -> impl Future<Output = TempoResult<()>> {
        let (tx, rx) = oneshot::channel::<()>();
        let mut tx = Some(tx);
        self.call(
            id,
            move || {
                if let Some(tx) = tx.take() {
                    let _ = tx.send(());
                }
            },
            delay_seconds,
        );
        async move { rx.await.map_err(|_| TempoError::WaitCancelled) }
    }

    /// Outstanding (pending or paused) entry count
    pub fn pending(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// The ticker whose virtual time drives this scheduler
    pub fn ticker(&self) -> &Arc<Ticker> {
        &self.ticker
    }

    /// One pass: advance pending entries by the scaled delta and fire the
    /// due ones. Entry callbacks run with no lock held, so they may
    /// schedule or kill re-entrantly; entries created during the pass are
    /// left untouched until the next one.
    fn advance(state: &Arc<Mutex<SchedulerState>>, delta_seconds: f64) {
        let due: Vec<DelayedCallback> = {
            let mut s = state.lock();
            s.pass += 1;
            let pass = s.pass;
            let mut due = Vec::new();
            for entry in s.entries.iter_mut() {
                if entry.created_pass >= pass || entry.state != CallState::Pending {
                    continue;
                }
                entry.remaining -= delta_seconds;
                if entry.remaining <= 0.0 {
                    entry.state = CallState::Fired;
                    due.push(entry.callback.clone());
                }
            }
            s.entries
                .retain(|e| matches!(e.state, CallState::Pending | CallState::Paused));
            due
        };
        for callback in due {
            (&mut *callback.lock())();
        }
    }
}

impl Drop for DelayedScheduler {
    fn drop(&mut self) {
        self.ticker.remove(self.tick_id);
        self.state.lock().entries.clear();
    }
}
