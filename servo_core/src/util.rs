//! Integer coordinate helpers.

/// Largest accepted degree command.
pub const DEGREE_MAX: u8 = 180;

/// Linear re-mapping of `x` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// Integer arithmetic in 64 bits, truncating toward zero like the classic
/// microcontroller `map()`. Inputs outside the source range extrapolate.
/// A degenerate source range maps everything to `out_min`.
#[inline]
pub fn map_range(x: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    if in_max == in_min {
        return out_min;
    }
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Pulse width for a degree command, or `None` above 180.
#[inline]
pub fn degree_to_pulse(degrees: u8, pulse_min: u16, pulse_max: u16) -> Option<u16> {
    if degrees > DEGREE_MAX {
        return None;
    }
    let p = map_range(
        i64::from(degrees),
        0,
        i64::from(DEGREE_MAX),
        i64::from(pulse_min),
        i64::from(pulse_max),
    );
    Some(saturate_u16(p))
}

/// Clamp a wide intermediate into the `u16` domain.
#[inline]
pub fn saturate_u16(v: i64) -> u16 {
    v.clamp(0, i64::from(u16::MAX)) as u16
}
