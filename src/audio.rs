//! Deterministic synthetic signals fed to plugins under test.
//!
//! Every generator is reproducible: the determinism scenarios rely on
//! run 0 and run 1 seeing bit-identical input, so even the "random"
//! signal comes from a fixed-seed PCG stream.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Seed for the random-input scenario. Fixed so reruns are comparable.
pub const NOISE_SEED: u64 = 0x5eed_f00d;

/// Slow sine sweep, `gain * sin(i / 10)`. Gain 1.0 is the "normal"
/// signal; gain 1000.0 drives the over-range scenario.
#[must_use]
pub fn sine(len: usize, gain: f32) -> Vec<f32> {
    (0..len)
        .map(|i| gain * (i as f32 / 10.0).sin())
        .collect()
}

/// All digital zeros.
#[must_use]
pub fn silence(len: usize) -> Vec<f32> {
    vec![0.0; len]
}

/// Uniform noise in [-1, 1] from a seeded PCG stream.
#[must_use]
pub fn noise(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    (0..len)
        .map(|_| (rng.r#gen::<f64>() * 2.0 - 1.0) as f32)
        .collect()
}

/// The comparison-run signal: the unit sine with a hard edge spliced in
/// at one fifth and four fifths of the way through (two samples forced
/// to -1 then 0), so plugins that only react to transients still emit
/// something to compare.
#[must_use]
pub fn spiked_sine(len: usize) -> Vec<f32> {
    let mut signal = sine(len, 1.0);
    for spike_at in [len / 5, len * 4 / 5] {
        for (offset, sample) in signal.iter_mut().skip(spike_at).take(2).enumerate() {
            *sample = offset as f32 - 1.0;
        }
    }
    signal
}

/// Duplicate a signal across `channels` identical channels.
#[must_use]
pub fn replicate(signal: Vec<f32>, channels: usize) -> Vec<Vec<f32>> {
    let mut out = Vec::with_capacity(channels);
    for _ in 1..channels {
        out.push(signal.clone());
    }
    out.push(signal);
    out
}
