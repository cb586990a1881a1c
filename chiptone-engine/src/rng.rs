//! `rand`-backed noise sources for the `noise` waveform.
//!
//! Live play uses [`ThreadNoise`]; reproducible renders and statistical tests
//! use [`SeededNoise`]. For exact-value tests see
//! [`chiptone_core::wave::SequenceNoise`].

use chiptone_core::wave::NoiseSource;
use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// Uniform noise from the thread-local generator. Not reproducible.
#[derive(Clone, Debug, Default)]
pub struct ThreadNoise(ThreadRng);

impl ThreadNoise {
    pub fn new() -> Self {
        Self(rand::thread_rng())
    }
}

impl NoiseSource for ThreadNoise {
    #[inline]
    fn next_bipolar(&mut self) -> f64 {
        self.0.gen_range(-1.0..=1.0)
    }
}

/// Uniform noise from a seeded generator; the same seed gives the same stream.
#[derive(Clone, Debug)]
pub struct SeededNoise(StdRng);

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl NoiseSource for SeededNoise {
    #[inline]
    fn next_bipolar(&mut self) -> f64 {
        self.0.gen_range(-1.0..=1.0)
    }
}
