use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use drawbar::oscillators::{HARMONICS, MAX_DRAWBAR};
use drawbar::{ToneControls, ToneGenerator, WaveTable, WaveTables};
use rand::SeedableRng;
use rand::rngs::StdRng;

type Osc = ToneGenerator<'static, 8, 1024>;

fn constant(value: i8) -> &'static WaveTable<8> {
    WaveTable::new([value; 8]).leak()
}

/// Four distinct constant tables per set. With equal gains on both timbres,
/// every drawbar reads `17 * (wave1 + wave2)` and the bass reads
/// `17 * (bass_wave1 + bass_wave2)`, so any mixture of old and new references
/// lands on a value neither complete set produces.
fn table_sets() -> (WaveTables<'static, 8>, WaveTables<'static, 8>) {
    let a = WaveTables::new(constant(1), constant(2), constant(4), constant(8));
    let b = WaveTables::new(constant(-1), constant(-2), constant(-4), constant(-8));
    (a, b)
}

// 17 * (6 * 1 + 6 * 4 + 2 + 8) = 680, shifted right by 2
const SET_A: i16 = 170;
const SET_B: i16 = -170;

fn configured(seed: u64) -> Osc {
    let osc = Osc::with_rng(&mut StdRng::seed_from_u64(seed));
    osc.set_master_note(-27);
    osc.set_gains([MAX_DRAWBAR; HARMONICS], 32);
    osc
}

#[test]
fn test_controls_handle_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ToneControls<'static, 256, 16384>>();

    fn assert_send<T: Send>() {}
    assert_send::<ToneGenerator<'static, 256, 16384>>();
}

#[test]
fn test_interleaved_table_swaps_are_never_torn() {
    let (a, b) = table_sets();
    let mut osc = configured(1);
    let controls = osc.controls();

    // Swap on an irregular schedule between audio-rate calls
    let mut expected = None;
    for step in 0..5_000u32 {
        if step % 7 == 0 || step % 11 == 3 {
            let use_a = (step / 7) % 2 == 0;
            controls.set_wave_table_set(if use_a { a } else { b });
            expected = Some(if use_a { SET_A } else { SET_B });
        }

        let sample = if step % 5 == 0 {
            osc.ph_mod(drawbar::fixmath::f64_to_q15n16(0.3))
        } else {
            osc.next()
        };
        assert_eq!(sample, expected.unwrap_or(0), "step {step}");
        assert_eq!(osc.peek(), sample);
    }
}

#[test]
fn test_concurrent_table_swaps_are_never_torn() {
    let (a, b) = table_sets();
    let mut osc = configured(2);
    let controls = osc.controls();
    controls.set_wave_table_set(a);

    let done = AtomicBool::new(false);
    let torn = thread::scope(|scope| {
        scope.spawn(|| {
            let mut use_a = false;
            while !done.load(Ordering::Relaxed) {
                controls.set_wave_table_set(if use_a { a } else { b });
                use_a = !use_a;
            }
        });

        let torn = (0..200_000)
            .map(|_| osc.next())
            .filter(|&sample| sample != SET_A && sample != SET_B)
            .count();
        done.store(true, Ordering::Relaxed);
        torn
    });
    assert_eq!(torn, 0);
}

#[test]
fn test_concurrent_gain_updates_are_never_torn() {
    let mut osc = configured(3);
    let controls = osc.controls();
    controls.set_wave_table_set(WaveTables::uniform(constant(100)));
    controls.set_gains([MAX_DRAWBAR; HARMONICS], 0);

    // Fourteen gains of either 35/0 or all zero
    let full: i16 = (7 * 35 * 100) >> 2;

    let done = AtomicBool::new(false);
    let torn = thread::scope(|scope| {
        scope.spawn(|| {
            let mut loud = false;
            while !done.load(Ordering::Relaxed) {
                let level = if loud { MAX_DRAWBAR } else { 0 };
                controls.set_gains([level; HARMONICS], 0);
                loud = !loud;
            }
        });

        let torn = (0..200_000)
            .map(|_| osc.next())
            .filter(|&sample| sample != full && sample != 0)
            .count();
        done.store(true, Ordering::Relaxed);
        torn
    });
    assert_eq!(torn, 0);
}

#[test]
fn test_concurrent_frequency_updates_keep_octaves() {
    let mut osc = configured(4);
    let controls = osc.controls();
    let reader = osc.controls();

    let done = AtomicBool::new(false);
    let broken = thread::scope(|scope| {
        scope.spawn(|| {
            let mut note = -60;
            while !done.load(Ordering::Relaxed) {
                controls.set_master_note(note);
                note = if note >= 30 { -60 } else { note + 1 };
            }
        });

        let mut broken = 0;
        for _ in 0..100_000 {
            // How far each harmonic actually moved in one sample
            let before = osc.phases();
            osc.next();
            let after = osc.phases();
            let step: [u32; HARMONICS] = std::array::from_fn(|h| after[h].wrapping_sub(before[h]));

            let increments = reader.phase_increments();
            let played = (1..HARMONICS).all(|h| step[h] == step[0] >> h);
            let stored = (1..HARMONICS).all(|h| increments[h] == increments[0] >> h);
            if !(played && stored) {
                broken += 1;
            }
        }
        done.store(true, Ordering::Relaxed);
        broken
    });
    assert_eq!(broken, 0);
}
