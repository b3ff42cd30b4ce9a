//! Core signal trait and sample helpers.
//!
//! Everything in this crate produces signed 16-bit samples. The tone generator's
//! worst-case output is bounded by [`MAX_AMPLITUDE`], so hosts that want floats
//! can normalise with [`to_f64`].

/// Largest magnitude a mixed sample can reach.
///
/// The fourteen weighted table reads sum to at most `i16::MAX` before the final
/// divide-by-four, which leaves 14 bits of signed output.
pub const MAX_AMPLITUDE: i16 = i16::MAX >> 2;

/// Common interface for all fixed-point signal sources.
///
/// The trait provides two fundamental operations:
/// - Single sample generation via `next_sample()`
/// - Batch processing via `process()`
pub trait Signal {
    /// Generates the next sample from the signal.
    fn next_sample(&mut self) -> i16;

    /// Generates multiple samples into a buffer.
    ///
    /// Default implementation calls `next_sample()` for each element.
    /// Implementors may override this for more efficient batch processing.
    ///
    /// # Arguments
    ///
    /// * `buffer` - Mutable slice to fill with samples
    fn process(&mut self, buffer: &mut [i16]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

/// Maps a mixed sample onto `[-1.0, 1.0]`.
///
/// # Examples
///
/// ```
/// use drawbar::core::{to_f64, MAX_AMPLITUDE};
///
/// assert_eq!(to_f64(0), 0.0);
/// assert_eq!(to_f64(MAX_AMPLITUDE), 1.0);
/// ```
#[inline]
pub fn to_f64(sample: i16) -> f64 {
    (f64::from(sample) / f64::from(MAX_AMPLITUDE)).clamp(-1.0, 1.0)
}
