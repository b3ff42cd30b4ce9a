//! Drawbar - A fixed-point additive wavetable tone generator
//!
//! This library provides an interrupt-safe, seven-drawbar oscillator bank for
//! embedded audio synthesis, plus the fixed-point pitch and wavetable helpers it
//! is programmed with.

pub mod core;
pub mod fixmath;
pub mod midi;
pub mod oscillators;
pub mod wavetable;

// Re-export commonly used types at the crate root
pub use crate::core::{AudioSignal, Signal};
pub use fixmath::{Q15n16, Q16n16};
pub use oscillators::{Drawbars, ToneControls, ToneGenerator};
pub use wavetable::{TableSizeError, WaveTable, WaveTables};
