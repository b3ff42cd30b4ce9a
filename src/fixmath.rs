//! Fixed-point number formats used by the oscillator.
//!
//! Names follow the `QmnN` convention: `Q16n16` is an unsigned value with 16
//! integer and 16 fractional bits, `Q15n16` its signed counterpart (15 integer
//! bits plus sign). Both are thin aliases over the [`fixed`] crate so raw bit
//! access stays available via `to_bits()` / `from_bits()`.

use fixed::types::{I16F16, U16F16};

/// Unsigned 16.16 fixed point, used for frequencies in Hz and note numbers.
pub type Q16n16 = U16F16;

/// Signed 16.16 fixed point, used for phase-modulation proportions.
pub type Q15n16 = I16F16;

/// Fractional bits in a phase accumulator.
///
/// Only the bits above this precision index the wavetable.
pub const OSCIL_F_BITS: u32 = 16;

/// Widens an integer into a `Q16n16` with zero fraction.
#[inline]
pub const fn q16n0_to_q16n16(value: u16) -> Q16n16 {
    Q16n16::from_bits((value as u32) << 16)
}

/// Converts a biased note number into the `Q16n16` note the pitch table expects.
///
/// The caller contracts that `value` is non-negative; out of range values wrap.
#[inline]
pub const fn q16n16_from_note(value: i32) -> Q16n16 {
    Q16n16::from_bits((value as u32) << 16)
}

/// Converts a floating-point value to `Q16n16`, saturating at the format limits.
///
/// Only meant for the configuration path; the audio path never touches floats.
#[inline]
pub fn f64_to_q16n16(value: f64) -> Q16n16 {
    Q16n16::saturating_from_num(value)
}

/// Converts a `Q16n16` back into a float.
#[inline]
pub fn q16n16_to_f64(value: Q16n16) -> f64 {
    value.to_num::<f64>()
}

/// Converts a floating-point proportion to `Q15n16`, saturating at the format limits.
#[inline]
pub fn f64_to_q15n16(value: f64) -> Q15n16 {
    Q15n16::saturating_from_num(value)
}
