//! Ticker capability mixin
//!
//! `TickerHost` gives an owning object per-frame callbacks without manual
//! identity or name bookkeeping: the ticker name is derived from the owner
//! (or generated), the ticker is acquired lazily on first use, and minted
//! callback ids are tracked so the owner can tear everything down at once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tempo_core::{CallbackId, VirtualTime};

use crate::registry::TickerRegistry;
use crate::ticker::{TickEvent, Ticker};

static HOST_SEQ: AtomicU64 = AtomicU64::new(1);

pub struct TickerHost {
    registry: Arc<TickerRegistry>,
    name: String,
    ticker: Option<Arc<Ticker>>,
    ids: Vec<CallbackId>,
}

impl TickerHost {
    /// Host with a generated ticker name
    pub fn new(registry: Arc<TickerRegistry>) -> Self {
        let n = HOST_SEQ.fetch_add(1, Ordering::Relaxed);
        Self::named(registry, &format!("host:{n}"))
    }

    /// Host whose ticker name is derived from the owner's own name
    pub fn named(registry: Arc<TickerRegistry>, owner_name: &str) -> Self {
        TickerHost {
            registry,
            name: owner_name.to_string(),
            ticker: None,
            ids: Vec::new(),
        }
    }

    pub fn ticker_name(&self) -> &str {
        &self.name
    }

    fn ticker(&mut self) -> Arc<Ticker> {
        match &self.ticker {
            Some(ticker) => ticker.clone(),
            None => {
                let ticker = self.registry.get_ticker(&self.name, true);
                self.ticker = Some(ticker.clone());
                ticker
            }
        }
    }

    /// Register a per-frame callback; the returned id cancels it
    pub fn add_ticker(&mut self, callback: impl FnMut(&TickEvent) + Send + 'static) -> CallbackId {
        let id = CallbackId::next();
        self.ticker().add(id, callback);
        self.ids.push(id);
        id
    }

    /// Unregister one tracked callback
    pub fn remove_ticker(&mut self, id: CallbackId) {
        if let Some(pos) = self.ids.iter().position(|&i| i == id) {
            self.ids.swap_remove(pos);
        }
        if let Some(ticker) = &self.ticker {
            ticker.remove(id);
        }
    }

    /// Unregister every tracked callback
    pub fn remove_tickers(&mut self) {
        let ids = std::mem::take(&mut self.ids);
        if let Some(ticker) = &self.ticker {
            ticker.remove_many(&ids);
        }
    }

    /// Freeze this owner's callbacks
    pub fn pause_tickers(&self) {
        if let Some(ticker) = &self.ticker {
            ticker.sleep();
        }
    }

    /// Resume this owner's callbacks
    pub fn resume_tickers(&self) {
        if let Some(ticker) = &self.ticker {
            ticker.wake();
        }
    }

    /// Virtual time of the owner's ticker; zero before first use
    pub fn ticker_time(&self) -> VirtualTime {
        self.ticker
            .as_ref()
            .map(|t| t.time())
            .unwrap_or(VirtualTime::ZERO)
    }
}

impl Drop for TickerHost {
    fn drop(&mut self) {
        self.remove_tickers();
    }
}
