//! Seven-drawbar additive wavetable oscillator in fixed point.
//!
//! # Design Overview
//!
//! `ToneGenerator` sums seven table-lookup oscillators tuned in octaves, the way
//! the drawbars of a tonewheel organ stack footages. Harmonic 0 is the highest
//! drawbar; each following harmonic sounds one octave lower, down to the bass
//! harmonic 6. Every harmonic reads the same cell from two tables (timbre set 1
//! and timbre set 2) and weights them with its own pair of 8-bit gains, so the
//! `mix` control cross-fades between two timbres at a shared phase.
//!
//! ## Core Architecture
//!
//! 1. **Phase accumulators**: seven `u32` counters with [`OSCIL_F_BITS`]
//!    fractional bits. They wrap modulo 2^32 and only the bits above the
//!    fraction index the table, masked to `NUM_TABLE_CELLS - 1`.
//!
//! 2. **Increments**: `phase_increment[i] == phase_increment[0] >> i`. The
//!    octave relationship is exact; nothing else ever writes the lower six.
//!
//! 3. **Mixing**: fourteen weighted 8-bit reads summed and shifted right by 2.
//!    There is no interpolation between adjacent cells; the lookup is
//!    nearest-cell on purpose.
//!
//! ## Two Execution Contexts
//!
//! The audio-rate context owns the `ToneGenerator` and calls [`next`],
//! [`peek`] or [`ph_mod`] once per sample. A configuration context holds the
//! [`ToneControls`] handle returned by [`ToneGenerator::controls`] and
//! reprograms increments, gains and tables from wherever it runs.
//!
//! Tables are borrowed for the lifetime `'a`, so neither the generator nor any
//! controls handle can outlive them. A generator that has to be `'static`, for
//! instance one moved into an audio callback, uses `'static` tables from a
//! `static` or [`WaveTable::leak`].
//!
//! Every setter computes its new fields first and then commits them inside one
//! `critical_section::with` scope. The audio side copies the whole control
//! bundle inside the same kind of scope once per sample, so it sees either all
//! of a setter's writes or none of them. The phases themselves belong to the
//! audio side alone and are never locked.
//!
//! ## Caller Contracts
//!
//! Nothing on these paths reports errors. Drawbar levels are 0-1023, `mix` is
//! 0-64, notes are -96..=31 and pitch-bend shifts are -1023..=1023. Debug
//! builds assert these; release builds produce wrapped or distorted audio
//! instead of failing.
//!
//! ## Example Usage
//!
//! ```
//! use drawbar::{ToneGenerator, WaveTable, WaveTables};
//!
//! let sine = WaveTable::<256>::sine();
//! let square = WaveTable::<256>::square();
//!
//! let mut osc = ToneGenerator::<256, 16384>::new();
//! let controls = osc.controls();
//!
//! controls.set_wave_table_set(WaveTables::new(&sine, &sine, &square, &square));
//! controls.set_master_note(-27); // A4
//! controls.set_gains([1023, 0, 1023, 0, 512, 0, 0], 16);
//!
//! let sample: i16 = osc.next();
//! assert!(sample.abs() <= drawbar::core::MAX_AMPLITUDE);
//! ```
//!
//! [`next`]: ToneGenerator::next
//! [`peek`]: ToneGenerator::peek
//! [`ph_mod`]: ToneGenerator::ph_mod

use std::cell::Cell;
use std::sync::Arc;

use critical_section::Mutex;
use rand::Rng;
use tracing::{debug, trace};

use crate::core::{AudioSignal, Signal};
use crate::fixmath::{OSCIL_F_BITS, Q15n16, Q16n16, q16n16_from_note};
use crate::midi::{MAX_NOTE, mtof};
use crate::wavetable::{WaveTable, WaveTables};

/// Number of octave-spaced harmonics.
pub const HARMONICS: usize = 7;

/// Index of the bass harmonic, the only one reading the bass tables.
pub const BASS: usize = HARMONICS - 1;

/// Full-scale drawbar level.
pub const MAX_DRAWBAR: u16 = 1023;

/// `mix` value selecting timbre set 2 only.
pub const MAX_MIX: u8 = 64;

/// Largest pitch-bend shift; +1023 doubles the frequency.
pub const MAX_SHIFT: i32 = 1023;

/// Offset added to note numbers before pitch lookup.
pub const NOTE_BIAS: i32 = 96;

/// Gain budget per unit of mix, ~ 64 * 4 * 1024 / (1023 * 7).
///
/// Seven full drawbars then sum to at most 245, so fourteen reads of -128
/// stay within `i16` before the final shift.
const GAIN_BUDGET: u32 = 36;

/// Drawbar levels, lowest-pitched first.
pub type Drawbars = [u16; HARMONICS];

/// Everything the configuration context writes.
#[derive(Debug, Clone, Copy)]
struct ControlState<'a, const N: usize> {
    phase_increment: [u32; HARMONICS],
    gain1: [i8; HARMONICS],
    gain2: [i8; HARMONICS],
    tables: Option<WaveTables<'a, N>>,
}

impl<const N: usize> ControlState<'_, N> {
    const SILENT: Self = Self {
        phase_increment: [0; HARMONICS],
        gain1: [0; HARMONICS],
        gain2: [0; HARMONICS],
        tables: None,
    };
}

/// The shared half of a [`ToneGenerator`]: increments, gains and tables.
///
/// All setters take `&self` and may be called from any thread while the
/// generator keeps producing samples. Each call is committed atomically with
/// respect to the audio side and does a bounded amount of work.
///
/// # Type Parameters
///
/// * `'a` - How long the wavetables are borrowed for
/// * `NUM_TABLE_CELLS` - Cells per wavetable (power of two)
/// * `UPDATE_RATE` - Samples the generator is clocked at per second (power of two)
pub struct ToneControls<'a, const NUM_TABLE_CELLS: usize, const UPDATE_RATE: u32> {
    state: Mutex<Cell<ControlState<'a, NUM_TABLE_CELLS>>>,
}

impl<const NUM_TABLE_CELLS: usize, const UPDATE_RATE: u32> Default
    for ToneControls<'_, NUM_TABLE_CELLS, UPDATE_RATE>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const NUM_TABLE_CELLS: usize, const UPDATE_RATE: u32>
    ToneControls<'a, NUM_TABLE_CELLS, UPDATE_RATE>
{
    const RATE_IS_POWER_OF_TWO: () = assert!(
        UPDATE_RATE.is_power_of_two(),
        "update rate must be a power of two"
    );

    /// Creates zeroed controls: no tables, zero increments, zero gains.
    pub fn new() -> Self {
        let () = WaveTable::<NUM_TABLE_CELLS>::SIZE_IS_POWER_OF_TWO;
        let () = Self::RATE_IS_POWER_OF_TWO;
        Self {
            state: Mutex::new(Cell::new(ControlState::SILENT)),
        }
    }

    /// Converts a frequency into the top harmonic's phase increment.
    ///
    /// The multiply/divide order depends on which of table size and update rate
    /// is larger, so the integer ratio is never truncated to zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use drawbar::ToneControls;
    /// use drawbar::fixmath::q16n0_to_q16n16;
    ///
    /// let inc = ToneControls::<256, 16384>::phase_increment_for(q16n0_to_q16n16(440));
    /// assert_eq!(inc, 450_560); // 440 * 256 / 16384 cells per sample, 16 fraction bits
    /// ```
    pub fn phase_increment_for(frequency: Q16n16) -> u32 {
        let frequency = frequency.to_bits();
        let cells = NUM_TABLE_CELLS as u32;
        if cells >= UPDATE_RATE {
            frequency.wrapping_mul(cells / UPDATE_RATE)
        } else {
            frequency / (UPDATE_RATE / cells)
        }
    }

    /// Computes the two gain sets for drawbar levels and a cross-fade position.
    ///
    /// `drawbars[0]` is the lowest drawbar and lands on the bass harmonic;
    /// `mix` 0 is all timbre set 1, 64 all timbre set 2.
    pub fn gains_for(drawbars: Drawbars, mix: u8) -> ([i8; HARMONICS], [i8; HARMONICS]) {
        debug_assert!(mix <= MAX_MIX, "mix {mix} above {MAX_MIX}");
        debug_assert!(
            drawbars.iter().all(|&level| level <= MAX_DRAWBAR),
            "drawbar level above {MAX_DRAWBAR}: {drawbars:?}"
        );

        // out-of-range inputs clamp in release builds so gains stay within i8
        let mix = mix.min(MAX_MIX);
        let scale1 = (GAIN_BUDGET * u32::from(MAX_MIX - mix)) >> 6;
        let scale2 = (GAIN_BUDGET * u32::from(mix)) >> 6;

        let mut gain1 = [0i8; HARMONICS];
        let mut gain2 = [0i8; HARMONICS];
        for harmonic in 0..HARMONICS {
            let level = u32::from(drawbars[BASS - harmonic].min(MAX_DRAWBAR));
            gain1[harmonic] = ((level * scale1) >> 10) as i8;
            gain2[harmonic] = ((level * scale2) >> 10) as i8;
        }
        (gain1, gain2)
    }

    /// Replaces all four wavetable references as one unit.
    ///
    /// Harmonics 0-5 read `wave1`/`wave2`, the bass harmonic reads
    /// `bass_wave1`/`bass_wave2`.
    pub fn set_wave_tables(
        &self,
        wave1: &'a WaveTable<NUM_TABLE_CELLS>,
        bass_wave1: &'a WaveTable<NUM_TABLE_CELLS>,
        wave2: &'a WaveTable<NUM_TABLE_CELLS>,
        bass_wave2: &'a WaveTable<NUM_TABLE_CELLS>,
    ) {
        self.set_wave_table_set(WaveTables::new(wave1, bass_wave1, wave2, bass_wave2));
    }

    /// Replaces all four wavetable references from a prepared bundle.
    ///
    /// The previous tables are no longer read once this returns, so their owner
    /// may drop or reuse them.
    pub fn set_wave_table_set(&self, tables: WaveTables<'a, NUM_TABLE_CELLS>) {
        self.commit(|state| state.tables = Some(tables));
        trace!("wavetables committed");
    }

    /// Programs the oscillator frequency from a 16.16 value in Hz.
    ///
    /// All seven increments are written together; harmonic `i` gets the top
    /// increment shifted right by `i`.
    pub fn set_master_frequency_q16n16(&self, frequency: Q16n16) {
        let top = Self::phase_increment_for(frequency);
        let mut increments = [0u32; HARMONICS];
        for (harmonic, increment) in increments.iter_mut().enumerate() {
            *increment = top >> harmonic;
        }

        self.commit(|state| state.phase_increment = increments);
        trace!(%frequency, increment = top, "master frequency committed");
    }

    /// Programs the oscillator from a note number biased by -96.
    ///
    /// `note + 96` is a MIDI note, so `-27` plays A4.
    pub fn set_master_note(&self, note: i32) {
        self.set_master_frequency_q16n16(Self::note_frequency(note));
    }

    /// Programs the oscillator from a biased note plus a proportional bend.
    ///
    /// Adds `frequency / 1023 * shift`: +1023 doubles the frequency, -512
    /// roughly halves it.
    pub fn set_master_note_shifted(&self, note: i32, shift: i32) {
        debug_assert!(
            (-MAX_SHIFT..=MAX_SHIFT).contains(&shift),
            "shift {shift} outside +/-{MAX_SHIFT}"
        );

        let frequency = Self::note_frequency(note).to_bits();
        // divide first, the product would not fit 32 bits
        let bent = i64::from(frequency) + i64::from(frequency / 1023) * i64::from(shift);
        self.set_master_frequency_q16n16(Q16n16::from_bits(bent as u32));
    }

    /// Programs drawbar levels (0-1023, lowest drawbar first) and timbre mix (0-64).
    pub fn set_gains(&self, drawbars: Drawbars, mix: u8) {
        let (gain1, gain2) = Self::gains_for(drawbars, mix);
        self.commit(|state| {
            state.gain1 = gain1;
            state.gain2 = gain2;
        });
        trace!(?gain1, ?gain2, "gains committed");
    }

    /// Current phase increments, highest harmonic first.
    pub fn phase_increments(&self) -> [u32; HARMONICS] {
        self.snapshot().phase_increment
    }

    /// Current gains for timbre set 1 and timbre set 2.
    pub fn gains(&self) -> ([i8; HARMONICS], [i8; HARMONICS]) {
        let state = self.snapshot();
        (state.gain1, state.gain2)
    }

    /// Current wavetables, `None` until the first `set_wave_tables`.
    pub fn wave_tables(&self) -> Option<WaveTables<'a, NUM_TABLE_CELLS>> {
        self.snapshot().tables
    }

    fn note_frequency(note: i32) -> Q16n16 {
        debug_assert!(
            (-NOTE_BIAS..=i32::from(MAX_NOTE) - NOTE_BIAS).contains(&note),
            "note {note} outside the biased MIDI range"
        );
        mtof(q16n16_from_note(NOTE_BIAS + note))
    }

    #[inline]
    fn snapshot(&self) -> ControlState<'a, NUM_TABLE_CELLS> {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    #[inline]
    fn commit(&self, update: impl FnOnce(&mut ControlState<'a, NUM_TABLE_CELLS>)) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            update(&mut state);
            cell.set(state);
        });
    }
}

/// A seven-drawbar wavetable oscillator producing one `i16` sample per call.
///
/// One instance per sounding voice. The phases are seeded randomly so that many
/// voices started together do not beat against each other.
///
/// # Type Parameters
///
/// * `'a` - How long the wavetables are borrowed for
/// * `NUM_TABLE_CELLS` - Cells per wavetable (power of two)
/// * `UPDATE_RATE` - Samples per second the caller clocks `next()` at (power of two)
pub struct ToneGenerator<'a, const NUM_TABLE_CELLS: usize, const UPDATE_RATE: u32> {
    phase: [u32; HARMONICS],
    controls: Arc<ToneControls<'a, NUM_TABLE_CELLS, UPDATE_RATE>>,
}

impl<const NUM_TABLE_CELLS: usize, const UPDATE_RATE: u32> Default
    for ToneGenerator<'_, NUM_TABLE_CELLS, UPDATE_RATE>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const NUM_TABLE_CELLS: usize, const UPDATE_RATE: u32>
    ToneGenerator<'a, NUM_TABLE_CELLS, UPDATE_RATE>
{
    /// Creates a silent generator with phases seeded from the thread RNG.
    pub fn new() -> Self {
        Self::with_rng(&mut rand::thread_rng())
    }

    /// Creates a silent generator with phases seeded from `rng`.
    ///
    /// # Examples
    ///
    /// ```
    /// use drawbar::ToneGenerator;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    /// let a = ToneGenerator::<256, 16384>::with_rng(&mut rng);
    /// let b = ToneGenerator::<256, 16384>::with_rng(&mut rng);
    /// assert_ne!(a.phases(), b.phases());
    /// ```
    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut generator = Self {
            phase: [0; HARMONICS],
            controls: Arc::new(ToneControls::new()),
        };
        generator.reseed(rng);
        debug!(
            cells = NUM_TABLE_CELLS,
            rate = UPDATE_RATE,
            "tone generator created"
        );
        generator
    }

    /// Re-randomises every phase, e.g. when a voice is reassigned.
    pub fn reseed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for phase in &mut self.phase {
            *phase = rng.next_u32();
        }
    }

    /// A handle to the shared controls, for the configuration context.
    pub fn controls(&self) -> Arc<ToneControls<'a, NUM_TABLE_CELLS, UPDATE_RATE>> {
        Arc::clone(&self.controls)
    }

    /// The seven phase accumulators, highest harmonic first.
    pub fn phases(&self) -> [u32; HARMONICS] {
        self.phase
    }

    /// Advances every harmonic by one sample and returns the mixed output.
    #[allow(clippy::should_implement_trait)]
    #[inline]
    pub fn next(&mut self) -> i16 {
        let state = self.controls.snapshot();
        self.increment_phase(&state.phase_increment);
        self.mix(&state, 0)
    }

    /// Returns the mixed output at the current phases without advancing.
    #[inline]
    pub fn peek(&self) -> i16 {
        self.mix(&self.controls.snapshot(), 0)
    }

    /// Advances like [`next`](Self::next), then reads every harmonic offset by
    /// `proportion` of a table length.
    ///
    /// The offset only applies to this read; the stored phases are those
    /// `next()` would have produced.
    #[inline]
    pub fn ph_mod(&mut self, proportion: Q15n16) -> i16 {
        let state = self.controls.snapshot();
        self.increment_phase(&state.phase_increment);
        let offset = proportion.to_bits().wrapping_mul(NUM_TABLE_CELLS as i32) as u32;
        self.mix(&state, offset)
    }

    /// See [`ToneControls::set_wave_tables`].
    pub fn set_wave_tables(
        &self,
        wave1: &'a WaveTable<NUM_TABLE_CELLS>,
        bass_wave1: &'a WaveTable<NUM_TABLE_CELLS>,
        wave2: &'a WaveTable<NUM_TABLE_CELLS>,
        bass_wave2: &'a WaveTable<NUM_TABLE_CELLS>,
    ) {
        self.controls.set_wave_tables(wave1, bass_wave1, wave2, bass_wave2);
    }

    /// See [`ToneControls::set_master_frequency_q16n16`].
    pub fn set_master_frequency_q16n16(&self, frequency: Q16n16) {
        self.controls.set_master_frequency_q16n16(frequency);
    }

    /// See [`ToneControls::set_master_note`].
    pub fn set_master_note(&self, note: i32) {
        self.controls.set_master_note(note);
    }

    /// See [`ToneControls::set_master_note_shifted`].
    pub fn set_master_note_shifted(&self, note: i32, shift: i32) {
        self.controls.set_master_note_shifted(note, shift);
    }

    /// See [`ToneControls::set_gains`].
    pub fn set_gains(&self, drawbars: Drawbars, mix: u8) {
        self.controls.set_gains(drawbars, mix);
    }

    #[inline(always)]
    fn increment_phase(&mut self, increments: &[u32; HARMONICS]) {
        for (phase, increment) in self.phase.iter_mut().zip(increments) {
            *phase = phase.wrapping_add(*increment);
        }
    }

    #[inline(always)]
    fn mix(&self, state: &ControlState<'a, NUM_TABLE_CELLS>, offset: u32) -> i16 {
        let Some(tables) = state.tables else {
            return 0;
        };

        let mut sum = 0i32;
        for harmonic in 0..BASS {
            sum += read_pair(
                tables.wave1,
                tables.wave2,
                self.phase[harmonic].wrapping_add(offset),
                state.gain1[harmonic],
                state.gain2[harmonic],
            );
        }
        sum += read_pair(
            tables.bass_wave1,
            tables.bass_wave2,
            self.phase[BASS].wrapping_add(offset),
            state.gain1[BASS],
            state.gain2[BASS],
        );
        (sum >> 2) as i16
    }
}

/// Weighted sum of the same cell from two tables.
#[inline(always)]
fn read_pair<const N: usize>(
    set1: &WaveTable<N>,
    set2: &WaveTable<N>,
    phase: u32,
    gain1: i8,
    gain2: i8,
) -> i32 {
    let index = (phase >> OSCIL_F_BITS) as usize;
    i32::from(set1.read(index)) * i32::from(gain1) + i32::from(set2.read(index)) * i32::from(gain2)
}

impl<const NUM_TABLE_CELLS: usize, const UPDATE_RATE: u32> Signal
    for ToneGenerator<'_, NUM_TABLE_CELLS, UPDATE_RATE>
{
    fn next_sample(&mut self) -> i16 {
        self.next()
    }
}

impl<const NUM_TABLE_CELLS: usize, const UPDATE_RATE: u32> AudioSignal<UPDATE_RATE>
    for ToneGenerator<'_, NUM_TABLE_CELLS, UPDATE_RATE>
{
}
