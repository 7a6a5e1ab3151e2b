//! Virtual-time primitives
//!
//! A ticker's virtual time is accumulated scaled time, distinct from the
//! wall clock: it can run faster or slower than real time and is frozen
//! entirely while the ticker sleeps.

use std::ops::{Add, Sub};
use std::time::Duration;

/// Virtual time - microseconds of accumulated scaled time since ticker start
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualTime(pub i64);

impl VirtualTime {
    pub const ZERO: VirtualTime = VirtualTime(0);
    pub const MAX: VirtualTime = VirtualTime(i64::MAX);

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        VirtualTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        VirtualTime(millis * 1000)
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        VirtualTime((secs * 1_000_000.0) as i64)
    }

    #[inline]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        VirtualTime(self.0.saturating_add(duration.as_micros() as i64))
    }

    /// Advance by a (possibly fractional) number of scaled seconds
    #[inline]
    pub fn saturating_add_secs_f64(self, secs: f64) -> Self {
        VirtualTime(self.0.saturating_add((secs * 1_000_000.0) as i64))
    }
}

impl Add<Duration> for VirtualTime {
    type Output = VirtualTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        VirtualTime(self.0 + rhs.as_micros() as i64)
    }
}

impl Sub<VirtualTime> for VirtualTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: VirtualTime) -> Self::Output {
        let diff = self.0 - rhs.0;
        if diff >= 0 {
            Duration::from_micros(diff as u64)
        } else {
            Duration::ZERO
        }
    }
}

impl std::fmt::Debug for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vt({:.3}ms)", self.0 as f64 / 1000.0)
    }
}
