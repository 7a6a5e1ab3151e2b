//! Time-scale arithmetic
//!
//! Local and global scales compose multiplicatively. A scale of exactly 0
//! is reserved as the sleep sentinel and is never stored: anything at or
//! below the floor (including negative and non-finite input) is clamped to
//! `MIN_TIME_SCALE`.

/// Smallest representable time scale; the floor applied in place of 0
pub const MIN_TIME_SCALE: f64 = 1e-6;

/// Nominal display refresh rate used to express deltas in frame units
pub const STANDARD_FRAME_RATE: f64 = 60.0;

/// Clamp a requested time scale to the valid range
#[inline]
pub fn floor_time_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale >= MIN_TIME_SCALE {
        scale
    } else {
        MIN_TIME_SCALE
    }
}

/// Effective scale applied to a raw real-time delta
#[inline]
pub fn compose_scales(local: f64, global: f64) -> f64 {
    local * global
}
