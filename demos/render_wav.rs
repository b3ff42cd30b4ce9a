//! Renders a short drawbar phrase to a WAV file.
//!
//! Plays an arpeggio while sweeping the timbre mix and applying a phase
//! modulation wobble from a slow table-driven LFO. The file is written at the
//! generator's own update rate, so no resampling is involved.
//!
//! Usage: `cargo run --example render_wav [output.wav]`

use anyhow::Result;
use drawbar::fixmath::Q15n16;
use drawbar::oscillators::MAX_MIX;
use drawbar::{ToneGenerator, WaveTable, WaveTables};

const CELLS: usize = 512;
const RATE: u32 = 16384;

// C major arpeggio, biased so that note + 96 is MIDI
const NOTES: [i32; 8] = [-36, -32, -29, -24, -29, -32, -36, -48];
const SAMPLES_PER_NOTE: u32 = RATE / 2;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "drawbar.wav".to_string());

    let sine = WaveTable::<CELLS>::sine();
    let saw = WaveTable::<CELLS>::saw();
    let lfo = WaveTable::<CELLS>::sine();

    let mut osc = ToneGenerator::<CELLS, RATE>::new();
    let controls = osc.controls();
    controls.set_wave_table_set(WaveTables::new(&sine, &sine, &saw, &sine));

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;

    let total = SAMPLES_PER_NOTE * NOTES.len() as u32;
    for (step, &note) in NOTES.iter().enumerate() {
        controls.set_master_note(note);

        for i in 0..SAMPLES_PER_NOTE {
            let elapsed = step as u32 * SAMPLES_PER_NOTE + i;

            // control-rate updates, as a slower task would issue them
            if elapsed % 256 == 0 {
                let mix = (elapsed as u64 * u64::from(MAX_MIX) / u64::from(total)) as u8;
                controls.set_gains([700, 1023, 300, 600, 0, 200, 100], mix);
            }

            // ~5 Hz wobble of up to 1/64 of a cycle
            let lfo_index = (elapsed as usize * 5 * CELLS / RATE as usize) % CELLS;
            let proportion = Q15n16::from_bits(i32::from(lfo.read(lfo_index)) * 8);

            writer.write_sample(osc.ph_mod(proportion))?;
        }
    }

    writer.finalize()?;
    tracing::info!(%path, samples = total, "rendered");
    Ok(())
}
