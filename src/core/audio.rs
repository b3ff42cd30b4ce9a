//! Audio signal trait for rate-aware signals.

use super::Signal;

/// Common interface for anything that is clocked at a fixed audio rate.
///
/// This trait extends `Signal` with the rate at which `next_sample()` is
/// expected to be called. The rate is a const generic so that the
/// frequency-to-increment arithmetic can be resolved at compile time.
///
/// # Type Parameters
///
/// * `SAMPLE_RATE` - Calls to `next_sample()` per second (e.g. 16384 for an
///   embedded audio interrupt)
///
/// # Examples
///
/// ```
/// use drawbar::{AudioSignal, ToneGenerator};
///
/// let osc: ToneGenerator<256, 16384> = ToneGenerator::new();
/// assert_eq!(osc.sample_rate(), 16384);
/// ```
pub trait AudioSignal<const SAMPLE_RATE: u32>: Signal {
    /// Gets the rate at which this signal is being clocked, in Hz.
    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}
