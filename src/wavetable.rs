//! Single-cycle wavetables of signed 8-bit cells.
//!
//! A [`WaveTable`] holds one period of a waveform in `N` cells, where `N` is a
//! power of two so the oscillator can wrap its index with a mask. Tables are
//! read-only once built and oscillators only borrow them, so any number of
//! oscillators can reference the same memory.
//!
//! ```
//! use drawbar::WaveTable;
//!
//! static SQUARE: WaveTable<4> = WaveTable::new([127, 127, -127, -127]);
//!
//! assert_eq!(SQUARE.read(5), 127); // index wraps
//! let sine = WaveTable::<256>::sine().leak();
//! assert_eq!(sine.read(64), 127);
//! ```

use std::f64::consts::PI;
use std::fmt;

#[cfg(feature = "wavetable-loader")]
use std::path::Path;

/// Error returned when a runtime slice does not match the table size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSizeError {
    /// Cells the table type holds
    pub expected: usize,
    /// Cells that were supplied
    pub actual: usize,
}

impl fmt::Display for TableSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wavetable needs exactly {} cells, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for TableSizeError {}

/// One cycle of a waveform, `N` signed 8-bit cells.
///
/// # Type Parameters
///
/// * `N` - Number of cells; must be a power of two (checked at compile time)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveTable<const N: usize>([i8; N]);

impl<const N: usize> WaveTable<N> {
    pub(crate) const SIZE_IS_POWER_OF_TWO: () =
        assert!(N.is_power_of_two(), "wavetable size must be a power of two");

    /// Mask that wraps any index into the table.
    pub const INDEX_MASK: usize = N - 1;

    /// Wraps raw cells in a table.
    pub const fn new(cells: [i8; N]) -> Self {
        let () = Self::SIZE_IS_POWER_OF_TWO;
        Self(cells)
    }

    /// A table of zeros.
    pub const fn silence() -> Self {
        Self::new([0; N])
    }

    /// Builds a table by sampling a function over one cycle.
    ///
    /// The function maps phase `[0.0, 1.0)` to amplitude `[-1.0, 1.0]`; values
    /// outside that range are clipped to the 8-bit cell range.
    ///
    /// # Examples
    ///
    /// ```
    /// use drawbar::WaveTable;
    ///
    /// let ramp = WaveTable::<8>::from_fn(|phase| phase);
    /// assert_eq!(ramp.read(4), 64);
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let mut cells = [0i8; N];
        for (i, cell) in cells.iter_mut().enumerate() {
            let phase = i as f64 / N as f64;
            *cell = to_cell(f(phase));
        }
        Self::new(cells)
    }

    /// A sine wave table.
    pub fn sine() -> Self {
        Self::from_fn(|phase| (phase * 2.0 * PI).sin())
    }

    /// A rising sawtooth table.
    pub fn saw() -> Self {
        Self::from_fn(|phase| 2.0 * phase - 1.0)
    }

    /// A square wave table.
    pub fn square() -> Self {
        Self::from_fn(|phase| if phase < 0.5 { 1.0 } else { -1.0 })
    }

    /// A triangle wave table.
    pub fn triangle() -> Self {
        Self::from_fn(|phase| {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        })
    }

    /// Reads the cell at `index`, wrapped into the table.
    #[inline(always)]
    pub fn read(&self, index: usize) -> i8 {
        self.0[index & Self::INDEX_MASK]
    }

    /// The raw cells.
    pub fn cells(&self) -> &[i8; N] {
        &self.0
    }

    /// Moves the table to the heap for the rest of the program.
    ///
    /// For generators that must be `'static`, such as one moved into an audio
    /// callback. Everything else can borrow a table it owns instead.
    pub fn leak(self) -> &'static Self {
        Box::leak(Box::new(self))
    }

    /// Loads a wavetable from a WAV file (requires `wavetable-loader` feature).
    ///
    /// Reads the first channel of a mono or stereo WAV file, normalises it to
    /// `[-1.0, 1.0]` and picks `N` evenly spaced samples from it, so the file
    /// should hold exactly one cycle of the waveform.
    ///
    /// # Returns
    ///
    /// Returns `Ok(WaveTable)` on success, or an error if the file cannot be
    /// read, is not a valid WAV file, or holds no samples.
    #[cfg(feature = "wavetable-loader")]
    pub fn from_wav_file<P: AsRef<Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Result<Vec<f64>, _> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().map(|s| s.map(f64::from)).collect()
            }
            hound::SampleFormat::Int => {
                let max_value = (1i64 << (spec.bits_per_sample - 1)) as f64;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| f64::from(v) / max_value))
                    .collect()
            }
        };

        // Interleaved frames, keep the first channel
        let channel: Vec<f64> = samples?
            .into_iter()
            .step_by(usize::from(spec.channels.max(1)))
            .collect();

        if channel.is_empty() {
            return Err("WAV file contains no samples".into());
        }

        tracing::debug!(
            path = %path.display(),
            frames = channel.len(),
            cells = N,
            "loaded wavetable"
        );

        let mut cells = [0i8; N];
        for (i, cell) in cells.iter_mut().enumerate() {
            *cell = to_cell(channel[i * channel.len() / N]);
        }
        Ok(Self::new(cells))
    }
}

impl<const N: usize> TryFrom<&[i8]> for WaveTable<N> {
    type Error = TableSizeError;

    fn try_from(cells: &[i8]) -> Result<Self, Self::Error> {
        let cells: [i8; N] = cells.try_into().map_err(|_| TableSizeError {
            expected: N,
            actual: cells.len(),
        })?;
        Ok(Self::new(cells))
    }
}

/// Scales a `[-1.0, 1.0]` amplitude to a table cell.
fn to_cell(amplitude: f64) -> i8 {
    (amplitude * 127.0).round().clamp(-128.0, 127.0) as i8
}

/// The four table references one oscillator reads from.
///
/// Harmonics 0-5 read `wave1`/`wave2`; the bass harmonic reads
/// `bass_wave1`/`bass_wave2`. The `1` tables form timbre set 1 and the `2`
/// tables timbre set 2. The bundle is `Copy` so it can be swapped into an
/// oscillator as one unit.
#[derive(Debug, Clone, Copy)]
pub struct WaveTables<'a, const N: usize> {
    pub wave1: &'a WaveTable<N>,
    pub bass_wave1: &'a WaveTable<N>,
    pub wave2: &'a WaveTable<N>,
    pub bass_wave2: &'a WaveTable<N>,
}

impl<'a, const N: usize> WaveTables<'a, N> {
    pub fn new(
        wave1: &'a WaveTable<N>,
        bass_wave1: &'a WaveTable<N>,
        wave2: &'a WaveTable<N>,
        bass_wave2: &'a WaveTable<N>,
    ) -> Self {
        Self {
            wave1,
            bass_wave1,
            wave2,
            bass_wave2,
        }
    }

    /// Uses the same table for every slot.
    pub fn uniform(table: &'a WaveTable<N>) -> Self {
        Self::new(table, table, table, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_wraps_with_mask() {
        let table = WaveTable::<4>::new([1, 2, 3, 4]);
        assert_eq!(table.read(0), 1);
        assert_eq!(table.read(3), 4);
        assert_eq!(table.read(4), 1);
        assert_eq!(table.read(4 * 1000 + 2), 3);
    }

    #[test]
    fn test_sine_shape() {
        let sine = WaveTable::<256>::sine();
        assert_eq!(sine.read(0), 0);
        assert_eq!(sine.read(64), 127);
        assert_eq!(sine.read(128), 0);
        assert_eq!(sine.read(192), -127);
    }

    #[test]
    fn test_generators_stay_in_range() {
        for table in [
            WaveTable::<512>::sine(),
            WaveTable::<512>::saw(),
            WaveTable::<512>::square(),
            WaveTable::<512>::triangle(),
        ] {
            assert!(table.cells().iter().all(|&c| (-127..=127).contains(&c)));
        }
    }

    #[test]
    fn test_square_and_triangle() {
        let square = WaveTable::<8>::square();
        assert_eq!(
            square.cells(),
            &[127, 127, 127, 127, -127, -127, -127, -127]
        );

        let triangle = WaveTable::<8>::triangle();
        assert_eq!(triangle.read(0), 0);
        assert_eq!(triangle.read(2), 127);
        assert_eq!(triangle.read(6), -127);
    }

    #[test]
    fn test_from_fn_clips() {
        let loud = WaveTable::<4>::from_fn(|_| 4.0);
        assert!(loud.cells().iter().all(|&c| c == 127));
        let quiet = WaveTable::<4>::from_fn(|_| -4.0);
        assert!(quiet.cells().iter().all(|&c| c == -128));
    }

    #[test]
    fn test_try_from_slice() {
        let cells = [5i8; 16];
        let table = WaveTable::<16>::try_from(&cells[..]).unwrap();
        assert_eq!(table.read(7), 5);

        let err = WaveTable::<32>::try_from(&cells[..]).unwrap_err();
        assert_eq!(
            err,
            TableSizeError {
                expected: 32,
                actual: 16
            }
        );
        assert_eq!(err.to_string(), "wavetable needs exactly 32 cells, got 16");
    }

    #[test]
    fn test_uniform_set_shares_memory() {
        let table = WaveTable::<16>::silence();
        let set = WaveTables::uniform(&table);
        assert!(std::ptr::eq(set.wave1, set.bass_wave2));
    }

    #[test]
    fn test_leaked_table_is_static() {
        let table: &'static WaveTable<16> = WaveTable::<16>::saw().leak();
        let set: WaveTables<'static, 16> = WaveTables::uniform(table);
        assert_eq!(set.wave2.read(0), -127);
    }
}
