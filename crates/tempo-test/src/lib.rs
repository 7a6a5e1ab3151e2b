//! Tempo Test Harness - scripted frame driving and scheduling validation
//!
//! This crate provides:
//! - A scripted frame driver (fixed-step and jittered-step frame scripts)
//! - Integration tests for the cross-crate scheduling properties
//! - Dispatch and scheduler benchmarks

pub mod harness;
pub mod integration;

pub use harness::*;
