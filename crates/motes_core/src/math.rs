//! Vector helpers for the hot passes
//!
//! Re-exports glam plus the NaN-free normalisation and magnitude caps the
//! kernel relies on instead of error handling.

pub use glam::*;

/// Squared length below which a direction is treated as undefined.
pub const DIRECTION_EPSILON_SQ: f32 = 1.0e-12;

/// Normalise `v`, returning zero for near-zero or non-finite input.
#[inline]
pub fn safe_normalize(v: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if !len_sq.is_finite() || len_sq <= DIRECTION_EPSILON_SQ {
        return Vec3::ZERO;
    }
    v / len_sq.sqrt()
}

/// Scale `v` down so its length does not exceed `max`. Negative caps act as zero.
#[inline]
pub fn clamp_magnitude(v: Vec3, max: f32) -> Vec3 {
    v.clamp_length_max(max.max(0.0))
}
