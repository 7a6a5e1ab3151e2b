//! Tempo Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the tempo scheduler:
//! - Callback identities (CallbackId)
//! - Virtual-time primitives (VirtualTime)
//! - Time-scale arithmetic and the sleep-sentinel floor
//! - Error types

pub mod error;
pub mod id;
pub mod scale;
pub mod time;

pub use error::*;
pub use id::*;
pub use scale::*;
pub use time::*;
