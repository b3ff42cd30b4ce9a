//! Interactive drawbar organ.
//!
//! The tone generator runs inside the audio callback; this thread only holds its
//! `ToneControls` handle and reprograms it on key presses.
//!
//! Controls:
//! - A S D F G H J K (white keys) / W E T Y U (black keys): play notes
//! - 1-7: select drawbar (1 = lowest), UP/DOWN: raise/lower it
//! - LEFT/RIGHT: cross-fade sine <-> square timbre
//! - Z/X: octave down/up
//! - B: pitch bend up a whole tone, N: release bend
//! - Q or ESC: Quit

mod common;

use std::io::{Write, stdout};
use std::sync::Arc;

use anyhow::Result;
use common::{KeyAction, is_quit_key, run_interactive_demo};
use crossterm::{
    ExecutableCommand,
    event::{KeyCode, KeyEvent},
};
use drawbar::oscillators::{HARMONICS, MAX_DRAWBAR, MAX_MIX};
use drawbar::{Drawbars, ToneControls, ToneGenerator, WaveTable, WaveTables};

const CELLS: usize = 256;
const RATE: u32 = 16384;

// note + 96 is the MIDI note, so -36 is middle C
const MIDDLE_C: i32 = -36;
// one whole tone is 2^(2/12) - 1 ~ 0.1225 of the frequency
const WHOLE_TONE_SHIFT: i32 = 125;

struct Panel {
    controls: Arc<ToneControls<'static, CELLS, RATE>>,
    drawbars: Drawbars,
    selected: usize,
    mix: u8,
    octave: i32,
    note: i32,
    shift: i32,
}

impl Panel {
    fn apply_gains(&self) {
        self.controls.set_gains(self.drawbars, self.mix);
    }

    fn apply_pitch(&self) {
        self.controls
            .set_master_note_shifted(self.note + 12 * self.octave, self.shift);
    }

    fn draw(&self) -> Result<()> {
        let mut out = stdout();
        out.execute(crossterm::cursor::MoveTo(0, 0))?;
        out.execute(crossterm::terminal::Clear(
            crossterm::terminal::ClearType::All,
        ))?;

        write!(out, "Drawbar organ ({} cells @ {} Hz)\r\n\r\n", CELLS, RATE)?;
        for (i, level) in self.drawbars.iter().enumerate() {
            let marker = if i == self.selected { '>' } else { ' ' };
            let bar = "#".repeat(usize::from(*level) * 20 / usize::from(MAX_DRAWBAR));
            write!(out, "{marker} {}: {:<20} {:4}\r\n", i + 1, bar, level)?;
        }
        write!(
            out,
            "\r\nmix sine {:2} / {:2} square\r\n",
            MAX_MIX - self.mix,
            self.mix
        )?;
        write!(
            out,
            "note {} octave {:+} bend {}\r\n\r\nQ to quit\r\n",
            self.note + 12 * self.octave + 96,
            self.octave,
            self.shift
        )?;
        out.flush()?;
        Ok(())
    }
}

fn key_to_semitone(code: KeyCode) -> Option<i32> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    "awsedftgyhujk"
        .find(c.to_ascii_lowercase())
        .map(|i| i as i32)
}

fn handle_key(panel: &mut Panel, key: &KeyEvent) -> Result<KeyAction> {
    if is_quit_key(key.code) {
        return Ok(KeyAction::Exit);
    }

    if let Some(semitone) = key_to_semitone(key.code) {
        panel.note = MIDDLE_C + semitone;
        panel.apply_pitch();
    } else {
        match key.code {
            KeyCode::Char(c @ '1'..='7') => {
                panel.selected = (c as usize - '1' as usize).min(HARMONICS - 1);
            }
            KeyCode::Up => {
                let level = &mut panel.drawbars[panel.selected];
                *level = (*level + 128).min(MAX_DRAWBAR);
                panel.apply_gains();
            }
            KeyCode::Down => {
                let level = &mut panel.drawbars[panel.selected];
                *level = level.saturating_sub(128);
                panel.apply_gains();
            }
            KeyCode::Left => {
                panel.mix = panel.mix.saturating_sub(4);
                panel.apply_gains();
            }
            KeyCode::Right => {
                panel.mix = (panel.mix + 4).min(MAX_MIX);
                panel.apply_gains();
            }
            KeyCode::Char('z') => {
                panel.octave = (panel.octave - 1).max(-3);
                panel.apply_pitch();
            }
            KeyCode::Char('x') => {
                panel.octave = (panel.octave + 1).min(2);
                panel.apply_pitch();
            }
            KeyCode::Char('b') => {
                panel.shift = WHOLE_TONE_SHIFT;
                panel.apply_pitch();
            }
            KeyCode::Char('n') => {
                panel.shift = 0;
                panel.apply_pitch();
            }
            _ => return Ok(KeyAction::Continue),
        }
    }

    panel.draw()?;
    Ok(KeyAction::Continue)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let sine = WaveTable::<CELLS>::sine().leak();
    let square = WaveTable::<CELLS>::square().leak();
    let triangle = WaveTable::<CELLS>::triangle().leak();

    let generator = ToneGenerator::<CELLS, RATE>::new();
    let panel = Panel {
        controls: generator.controls(),
        drawbars: [512, 1023, 0, 768, 0, 256, 0],
        selected: 1,
        mix: 0,
        octave: 0,
        note: MIDDLE_C,
        shift: 0,
    };
    // bass harmonic gets a softer triangle in the square timbre
    panel
        .controls
        .set_wave_table_set(WaveTables::new(sine, sine, square, triangle));
    panel.apply_gains();
    panel.apply_pitch();

    run_interactive_demo::<_, _, _, _, RATE>(generator, panel, |panel| panel.draw(), handle_key)
}
