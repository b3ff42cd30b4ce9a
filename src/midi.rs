//! MIDI note to frequency conversion in fixed point.
//!
//! [`mtof`] is integer-only so it can run on the configuration path of targets
//! without a floating-point unit. The float-based [`Frequency`] type is a
//! convenience for hosts that do have one.

use crate::fixmath::{Q16n16, f64_to_q16n16};

/// Highest MIDI note [`mtof`] accepts; larger notes clamp to it.
pub const MAX_NOTE: u16 = 127;

/// `2^(k/12)` for each semitone `k` of an octave, in Q16.
const SEMITONE_RATIOS: [u32; 12] = [
    65536, 69433, 73562, 77936, 82570, 87480, 92682, 98193, 104032, 110218, 116772, 123715,
];

/// Frequency of the A three semitones below MIDI note 0 (6.875 Hz), in Q16n16.
///
/// Anchoring on an A keeps every A exact, A4 included.
const ANCHOR_Q16N16: u64 = 450_560;

/// Semitones between the anchor and MIDI note 0.
const ANCHOR_OFFSET: u32 = 3;

/// Q16n16 frequency of an integral MIDI note.
#[inline]
fn note_frequency(note: u32) -> u64 {
    let semitones = note + ANCHOR_OFFSET;
    let octave = semitones / 12;
    let ratio = u64::from(SEMITONE_RATIOS[(semitones % 12) as usize]);
    ((ANCHOR_Q16N16 << octave) * ratio) >> 16
}

/// Converts a fractional MIDI note number to a frequency in Hz.
///
/// Both the note and the returned frequency are `Q16n16`. The integer part of
/// the note selects an equal-tempered semitone (A4 = note 69 = 440 Hz); the
/// fractional part interpolates linearly towards the next semitone so glides
/// and bends stay smooth.
///
/// # Examples
///
/// ```
/// use drawbar::fixmath::q16n0_to_q16n16;
/// use drawbar::midi::mtof;
///
/// let a4 = mtof(q16n0_to_q16n16(69));
/// assert_eq!(a4.to_num::<u32>(), 440);
/// ```
pub fn mtof(note: Q16n16) -> Q16n16 {
    let bits = note.to_bits();
    let whole = (bits >> 16).min(u32::from(MAX_NOTE));
    let fraction = if whole == u32::from(MAX_NOTE) {
        0
    } else {
        u64::from(bits & 0xFFFF)
    };

    let low = note_frequency(whole);
    let high = note_frequency(whole + 1);
    let frequency = low + (((high - low) * fraction) >> 16);

    Q16n16::from_bits(frequency as u32)
}

/// A frequency value in Hz.
///
/// This type provides a unified way to name pitch on the configuration path,
/// accepting frequencies directly in Hz or MIDI note numbers, and converts to
/// the `Q16n16` value the oscillator is programmed with.
///
/// # Examples
///
/// ```
/// use drawbar::midi::Frequency;
///
/// // From Hz
/// let freq: Frequency = 440.0.into();
/// assert_eq!(freq.as_f64(), 440.0);
///
/// // From MIDI note number (69 = A4 = 440 Hz)
/// let freq: Frequency = 69u8.into();
/// assert!((freq.as_f64() - 440.0).abs() < 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frequency(f64);

impl Frequency {
    /// Creates a new frequency from Hz.
    pub fn from_hz(hz: f64) -> Self {
        Frequency(hz)
    }

    /// Creates a new frequency from a MIDI note number.
    ///
    /// # Arguments
    ///
    /// * `midi_note` - MIDI note number (0-127, where 69 = A4 = 440 Hz)
    pub fn from_midi(midi_note: u8) -> Self {
        // f = 440 * 2^((n - 69) / 12)
        let hz = 440.0 * 2.0_f64.powf((f64::from(midi_note) - 69.0) / 12.0);
        Frequency(hz)
    }

    /// Returns the frequency value in Hz.
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Returns the frequency as `Q16n16`, saturating outside 0..65536 Hz.
    pub fn to_q16n16(&self) -> Q16n16 {
        f64_to_q16n16(self.0)
    }
}

impl From<f64> for Frequency {
    fn from(hz: f64) -> Self {
        Frequency::from_hz(hz)
    }
}

impl From<u8> for Frequency {
    fn from(midi_note: u8) -> Self {
        Frequency::from_midi(midi_note)
    }
}
