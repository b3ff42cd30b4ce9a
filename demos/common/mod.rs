//! Common utilities for audio demos.

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, StreamConfig};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use drawbar::Signal;
use drawbar::core::to_f64;
use std::io::stdout;
use std::panic;
use std::time::Duration;

/// Key handling result that controls the event loop
pub enum KeyAction {
    /// Continue the event loop
    Continue,
    /// Exit the event loop
    Exit,
}

/// Clocks a fixed-rate source from an output device running at another rate.
///
/// Stands in for the timer interrupt an embedded target would use: the source
/// is stepped `SOURCE_RATE` times per second of device time and each value is
/// held until the next step.
pub struct RateAdapter<S, const SOURCE_RATE: u32> {
    source: S,
    device_rate: u32,
    accumulator: u32,
    current: i16,
}

impl<S: Signal, const SOURCE_RATE: u32> RateAdapter<S, SOURCE_RATE> {
    pub fn new(source: S, device_rate: u32) -> Self {
        Self {
            source,
            device_rate,
            accumulator: 0,
            current: 0,
        }
    }

    pub fn next_frame(&mut self) -> f64 {
        self.accumulator += SOURCE_RATE;
        while self.accumulator >= self.device_rate {
            self.accumulator -= self.device_rate;
            self.current = self.source.next_sample();
        }
        to_f64(self.current)
    }
}

/// Runs an interactive demo with terminal UI.
///
/// The source is moved into the audio callback and never locked; the key
/// handler talks to it only through whatever shared handle `ui` holds.
///
/// This function handles all the boilerplate:
/// - Audio device setup and stream creation
/// - Terminal raw mode and alternate screen
/// - Panic hook for terminal cleanup
/// - Event loop with key polling
pub fn run_interactive_demo<S, U, F, K, const SOURCE_RATE: u32>(
    source: S,
    mut ui: U,
    initial_ui: F,
    key_handler: K,
) -> Result<()>
where
    S: Signal + Send + 'static,
    F: FnOnce(&mut U) -> Result<()>,
    K: Fn(&mut U, &KeyEvent) -> Result<KeyAction>,
{
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))?;

    let config = device.default_output_config()?;
    let adapter = RateAdapter::<S, SOURCE_RATE>::new(source, config.sample_rate().0);

    let _stream = match config.sample_format() {
        SampleFormat::F32 => {
            create_audio_stream::<f32, _, SOURCE_RATE>(&device, &config.into(), adapter)?
        }
        SampleFormat::I16 => {
            create_audio_stream::<i16, _, SOURCE_RATE>(&device, &config.into(), adapter)?
        }
        SampleFormat::U16 => {
            create_audio_stream::<u16, _, SOURCE_RATE>(&device, &config.into(), adapter)?
        }
        sample_format => {
            return Err(anyhow::anyhow!(
                "Unsupported sample format: {}",
                sample_format
            ));
        }
    };

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(crossterm::cursor::Hide)?;

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        cleanup_terminal();
        original_hook(panic_info);
    }));

    initial_ui(&mut ui)?;

    loop {
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key_event) = event::read()?
            && key_event.kind != KeyEventKind::Release
        {
            match key_handler(&mut ui, &key_event)? {
                KeyAction::Continue => {}
                KeyAction::Exit => break,
            }
        }
    }

    cleanup_terminal();

    Ok(())
}

/// Creates an audio stream that pulls samples from the adapter.
fn create_audio_stream<T, S, const SOURCE_RATE: u32>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut adapter: RateAdapter<S, SOURCE_RATE>,
) -> Result<cpal::Stream>
where
    T: Sample + FromSample<f64> + cpal::SizedSample,
    S: Signal + Send + 'static,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let value: T = T::from_sample(adapter.next_frame());
                for s in frame.iter_mut() {
                    *s = value;
                }
            }
        },
        |err| tracing::error!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

/// Cleans up terminal state (cursor, alternate screen, raw mode).
fn cleanup_terminal() {
    let _ = stdout().execute(crossterm::cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Helper to check if a key code is a quit key (Q, ESC).
pub fn is_quit_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
}
