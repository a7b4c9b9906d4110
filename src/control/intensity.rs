//! Piecewise temperature-to-intensity mapping for one LED channel.
//!
//! ```text
//!  duty
//!  255 ┤■                                   freeze override (temp <= 0)
//!  max ┤                     ╭──┐           boosted top sixth
//!      ┤               ╭─────╯  │
//!      ┤        ╭──────╯        │
//!    0 ┼────────╯               └─────────  out of range → off
//!      0       low             high        temp
//! ```
//!
//! All arithmetic is integer with truncating division.

/// Map `temp` onto `0..=max` across `[low, high]`.
///
/// - Linear ramp: `max * (temp - low) / (high - low)`.
/// - With `boost`, when `high - temp` is inside the top sixth of the range,
///   the ramp is rescaled by `(3 + (high - temp)) / 6` and capped at `max`.
/// - `temp <= 0` returns 255 whatever `max` is.
/// - Anything that lands below 0 or above `max` returns 0.
/// - A zero-width range (`low == high`) returns 0.
pub fn intensity(temp: i32, low: i32, high: i32, max: u8, boost: bool) -> u8 {
    if temp <= 0 {
        return u8::MAX;
    }
    let (temp, low, high, max) = (i64::from(temp), i64::from(low), i64::from(high), i64::from(max));
    let span = high - low;
    if span == 0 {
        return 0;
    }

    let mut base = max * (temp - low) / span;
    let headroom = high - temp;
    if boost && headroom < span / 6 {
        base = (base * (3 + headroom) / 6).min(max);
    }

    if !(0..=max).contains(&base) {
        return 0;
    }
    // 0 ≤ base ≤ max ≤ 255
    base as u8
}
