//! Oscillator implementations for audio synthesis.
//!
//! This module contains the drawbar `ToneGenerator` and the `ToneControls`
//! handle used to program it from another context.

mod tone_generator;

pub use tone_generator::{
    BASS, Drawbars, HARMONICS, MAX_DRAWBAR, MAX_MIX, MAX_SHIFT, NOTE_BIAS, ToneControls,
    ToneGenerator,
};
