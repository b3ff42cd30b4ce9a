//! Core signal processing traits.
//!
//! This module provides the abstractions the tone generator plugs into:
//! - `Signal` trait for anything that yields fixed-point samples
//! - `AudioSignal` trait for signals clocked at a compile-time rate
//! - `to_f64` for handing samples to floating-point audio hosts

mod audio;
mod signal;

pub use audio::AudioSignal;
pub use signal::{MAX_AMPLITUDE, Signal, to_f64};
