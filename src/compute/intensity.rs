//! Intensity mapping from a scalar value onto the unit interval.

/// Map `value` linearly onto [0, 1] across `[lower, upper]`.
///
/// Values below `lower` map to 0. Values above `upper` map to 1 when
/// `saturate_above` is set and to 0 otherwise. A zero-width range maps its
/// single in-range value to 0 instead of dividing by zero.
#[inline]
pub fn intensity(value: f32, lower: f32, upper: f32, saturate_above: bool) -> f32 {
    if value < lower {
        0.0
    } else if value > upper {
        if saturate_above { 1.0 } else { 0.0 }
    } else if upper <= lower {
        0.0
    } else {
        (value - lower) / (upper - lower)
    }
}

/// Scale a unit intensity to a byte, truncating toward zero.
#[inline]
pub fn to_byte(unit: f32) -> u8 {
    // `as` saturates out-of-range floats and maps NaN to 0
    (unit * 255.0) as u8
}
