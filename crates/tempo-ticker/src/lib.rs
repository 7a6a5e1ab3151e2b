//! Tempo Ticker - named virtual clocks and per-frame dispatch
//!
//! This crate implements the scheduling core:
//! - Frame-driver boundary (clock trait + attach/detach registration)
//! - Ticker: an independently scalable, sleepable virtual clock
//! - TickerRegistry: single-instance-per-name table with global scale
//! - TickerHost: capability mixin for owning objects

pub mod driver;
pub mod host;
pub mod registry;
pub mod ticker;

pub use driver::*;
pub use host::*;
pub use registry::*;
pub use ticker::*;
