//! Tempo Sched - delayed one-shot calls in the virtual-time domain
//!
//! This crate implements the delayed-call scheduler:
//! - One-shot calls after a scaled virtual-time delay
//! - Identity-grouped kill / pause / resume and batch cancellation
//! - Next-tick deferral out of the current synchronous call stack
//! - An awaitable delay primitive backed by a oneshot channel

pub mod delayed;

pub use delayed::*;
