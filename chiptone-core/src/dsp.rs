//! Math backend and small buffer helpers shared by the generators.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Clean, side-effect free helpers that are easy to test
//!
//! Conventions:
//! - Generator math runs in `f64`; buffers store `f32`.
//! - All functions are `#[inline]` where useful to help the optimizer.

use core::f64::consts::PI;

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // libm (C math) in no_std
    if #[cfg(feature = "no-std")] {
        #[inline] pub(crate) fn m_sin(x: f64) -> f64 { libm::sin(x) }
        #[inline] pub(crate) fn m_floor(x: f64) -> f64 { libm::floor(x) }
        #[inline] pub(crate) fn m_ceil(x: f64) -> f64 { libm::ceil(x) }
        #[inline] pub(crate) fn m_abs(x: f64) -> f64 { libm::fabs(x) }
    // std backend
    } else {
        #[inline] pub(crate) fn m_sin(x: f64) -> f64 { x.sin() }
        #[inline] pub(crate) fn m_floor(x: f64) -> f64 { x.floor() }
        #[inline] pub(crate) fn m_ceil(x: f64) -> f64 { x.ceil() }
        #[inline] pub(crate) fn m_abs(x: f64) -> f64 { x.abs() }
    }
}

// --------------------------------- Constants -------------------------------------

/// 2π (one cycle in radians)
pub const TAU: f64 = 2.0 * PI;

/// Slack subtracted before rounding a buffer length up, so that `0.1 * 44100`
/// (which is `4410.000000000001` in binary) still yields 4410 samples.
pub const LENGTH_EPSILON: f64 = 1.0e-6;

// --------------------------------- Utilities -------------------------------------

#[inline]
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x < lo { lo } else if x > hi { hi } else { x }
}

/// Clamp a user-facing volume into `[0, 1]`. NaN maps to 0.
#[inline]
pub fn clamp_unit(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Three-way sign: `-1`, `0` or `1`.
///
/// Unlike `f64::signum`, both zeros map to `0.0`, so a square wave built on
/// top of this emits a single silent sample on an exact zero crossing.
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 { 1.0 } else if x < 0.0 { -1.0 } else { 0.0 }
}

/// Wrap phase into [0, 1). Negative phases wrap forward (Euclidean remainder).
#[inline]
pub fn wrap_phase01(p: f64) -> f64 {
    let w = p - m_floor(p);
    if w >= 1.0 { 0.0 } else { w }
}

/// Number of samples needed to hold `duration_s` seconds at `sr` Hz, rounded up.
#[inline]
pub fn sample_count(duration_s: f64, sr: u32) -> usize {
    let exact = duration_s * f64::from(sr);
    if exact <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = m_ceil(exact - LENGTH_EPSILON) as usize;
    n
}

/// Index of the first sample at or after `time_s` (floor of `time_s * sr`).
#[inline]
pub fn sample_index(time_s: f64, sr: u32) -> usize {
    let exact = time_s * f64::from(sr);
    if exact <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = m_floor(exact) as usize;
    n
}

// --------------------------------- Buffer helpers --------------------------------

/// Largest absolute sample value in `buf` (0 for an empty buffer).
#[inline]
pub fn peak_abs(buf: &[f32]) -> f32 {
    buf.iter().fold(0.0_f32, |m, &s| {
        let a = if s < 0.0 { -s } else { s };
        if a > m { a } else { m }
    })
}

/// Rescale `buf` so that its peak lands on `target`. Returns the peak measured
/// before scaling. A silent buffer is left untouched.
#[inline]
pub fn normalize_peak(buf: &mut [f32], target: f32) -> f32 {
    let peak = peak_abs(buf);
    if peak > 0.0 {
        for s in buf.iter_mut() {
            *s = *s / peak * target;
        }
    }
    peak
}

// --------------------------------- Tests (std only) ------------------------------
