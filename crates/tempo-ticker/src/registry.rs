//! Ticker registry - single-instance-per-name table with global scale
//!
//! The registry is an explicit, constructible object (injected where it is
//! needed) rather than process-global state, so tests can build isolated
//! scheduling domains. The table is append-only: tickers persist for the
//! registry's lifetime.

use std::sync::Arc;

use parking_lot::Mutex;

use tempo_core::floor_time_scale;

use crate::driver::FrameDriver;
use crate::ticker::Ticker;

struct RegistryInner {
    /// Insertion-ordered name → ticker table
    tickers: Vec<(String, Arc<Ticker>)>,
    global_scale: f64,
}

pub struct TickerRegistry {
    driver: Arc<FrameDriver>,
    inner: Mutex<RegistryInner>,
}

impl TickerRegistry {
    pub fn new(driver: Arc<FrameDriver>) -> Self {
        TickerRegistry {
            driver,
            inner: Mutex::new(RegistryInner {
                tickers: Vec::new(),
                global_scale: 1.0,
            }),
        }
    }

    pub fn driver(&self) -> &Arc<FrameDriver> {
        &self.driver
    }

    /// Return the named ticker, lazily creating it with the current global
    /// scale and attaching it to the driver. `auto_sleep` only applies at
    /// creation; a later lookup returns the existing ticker unchanged.
    pub fn get_ticker(&self, name: &str, auto_sleep: bool) -> Arc<Ticker> {
        let created = {
            let mut inner = self.inner.lock();
            if let Some((_, ticker)) = inner.tickers.iter().find(|(n, _)| n == name) {
                return ticker.clone();
            }
            let ticker = Ticker::new(name, &self.driver, auto_sleep, inner.global_scale);
            inner.tickers.push((name.to_string(), ticker.clone()));
            ticker
        };
        self.driver.add(&created);
        created
    }

    /// Store the global scale and broadcast it to every existing ticker.
    /// Iterates a stable snapshot so a ticker created mid-broadcast is not
    /// missed by the table (it picks up the stored value at creation).
    pub fn set_global_time_scale(&self, scale: f64) {
        let floored = floor_time_scale(scale);
        let snapshot = {
            let mut inner = self.inner.lock();
            inner.global_scale = floored;
            Self::snapshot(&inner)
        };
        for ticker in snapshot {
            ticker.set_global_time_scale(floored);
        }
    }

    pub fn global_time_scale(&self) -> f64 {
        self.inner.lock().global_scale
    }

    /// Freeze the entire scheduling domain (app backgrounding)
    pub fn store_time_before_sleep(&self) {
        for ticker in self.snapshot_now() {
            ticker.store_time_before_sleep();
        }
    }

    /// Unfreeze the entire scheduling domain, discarding the gap
    pub fn restore_time_after_sleep(&self) {
        for ticker in self.snapshot_now() {
            ticker.restore_time_after_sleep();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().tickers.is_empty()
    }

    pub fn ticker_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .tickers
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    fn snapshot(inner: &RegistryInner) -> Vec<Arc<Ticker>> {
        inner.tickers.iter().map(|(_, t)| t.clone()).collect()
    }

    fn snapshot_now(&self) -> Vec<Arc<Ticker>> {
        Self::snapshot(&self.inner.lock())
    }
}
