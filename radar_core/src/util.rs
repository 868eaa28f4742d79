//! Fixed-point distance helpers.
//!
//! All internal distances are integer millimeters (`i32`); floating
//! centimeters appear only at the config and telemetry edges. One
//! fractional cm digit equals exactly 1 mm, so edge rounding is exact.

/// Quantize a floating-point centimeter value to integer millimeters,
/// rounding to nearest and clamping to the i32 range. Non-finite
/// values (NaN/±Inf) map to 0.
#[inline]
pub fn quantize_cm_to_mm(x_cm: f32) -> i32 {
    if !x_cm.is_finite() {
        return 0;
    }
    let scaled = (x_cm * 10.0).round();
    if scaled >= i32::MAX as f32 {
        i32::MAX
    } else if scaled <= i32::MIN as f32 {
        i32::MIN
    } else {
        scaled as i32
    }
}

/// Millimeters back to centimeters for display and telemetry.
#[inline]
pub fn mm_to_cm(mm: i32) -> f32 {
    (mm as f32) / 10.0
}

/// Middle value of exactly three samples. Branch ladder instead of a
/// sort so the no-echo sentinel (`i32::MAX`) needs no special casing.
#[inline]
pub fn median3(a: i32, b: i32, c: i32) -> i32 {
    let lo = a.min(b);
    let hi = a.max(b);
    c.clamp(lo, hi)
}
