//! Waveform generator.
//!
//! Every periodic waveform is a pure function of **phase in cycles**
//! (`elapsed_seconds * frequency_hz`), not radians. Output is in `[-1, 1]`.
//!
//! `Noise` is the one exception: it draws from a caller-supplied
//! [`NoiseSource`], so tests can substitute a fixed sequence.

use core::fmt;
use core::str::FromStr;

use crate::dsp::{m_abs, m_sin, sign, wrap_phase01, TAU};

/// Oscillator waveform, chosen once per sound definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum WaveformKind {
    Sine,
    #[default]
    Square,
    Sawtooth,
    Triangle,
    Noise,
}

impl WaveformKind {
    pub const ALL: [WaveformKind; 5] = [
        WaveformKind::Sine,
        WaveformKind::Square,
        WaveformKind::Sawtooth,
        WaveformKind::Triangle,
        WaveformKind::Noise,
    ];

    /// Lower-case name used in bank files and on the command line.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            WaveformKind::Sine => "sine",
            WaveformKind::Square => "square",
            WaveformKind::Sawtooth => "sawtooth",
            WaveformKind::Triangle => "triangle",
            WaveformKind::Noise => "noise",
        }
    }

    /// `true` for every kind whose output depends on phase alone.
    #[inline]
    pub fn is_deterministic(self) -> bool {
        !matches!(self, WaveformKind::Noise)
    }
}

impl fmt::Display for WaveformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a waveform name is not one of the five known kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnknownWaveform;

impl fmt::Display for UnknownWaveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected one of: sine, square, sawtooth, triangle, noise")
    }
}

impl FromStr for WaveformKind {
    type Err = UnknownWaveform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WaveformKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(UnknownWaveform)
    }
}

// ------------------------------------ Noise --------------------------------------

/// A capability that yields uniform random values in `[-1, 1]`.
pub trait NoiseSource {
    fn next_bipolar(&mut self) -> f64;
}

impl<N: NoiseSource + ?Sized> NoiseSource for &mut N {
    #[inline]
    fn next_bipolar(&mut self) -> f64 {
        (**self).next_bipolar()
    }
}

/// Cycles through a fixed slice of values. Deterministic; handy in tests and
/// for reproducible renders. An empty slice yields silence.
#[derive(Clone, Debug)]
pub struct SequenceNoise<'a> {
    values: &'a [f64],
    idx: usize,
}

impl<'a> SequenceNoise<'a> {
    #[inline]
    pub fn new(values: &'a [f64]) -> Self {
        Self { values, idx: 0 }
    }
}

impl NoiseSource for SequenceNoise<'_> {
    #[inline]
    fn next_bipolar(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.idx];
        self.idx = (self.idx + 1) % self.values.len();
        v.clamp(-1.0, 1.0)
    }
}

/// Always returns zero. Use where no noise sound is ever built.
#[derive(Copy, Clone, Debug, Default)]
pub struct Silence;

impl NoiseSource for Silence {
    #[inline]
    fn next_bipolar(&mut self) -> f64 { 0.0 }
}

// --------------------------------- Generators ------------------------------------

#[inline]
pub fn sine(phase: f64) -> f64 {
    m_sin(TAU * phase)
}

/// `sign(sin(2π·phase))`; exactly `-1`, `0` or `1`.
#[inline]
pub fn square(phase: f64) -> f64 {
    sign(m_sin(TAU * phase))
}

#[inline]
pub fn sawtooth(phase: f64) -> f64 {
    2.0 * wrap_phase01(phase) - 1.0
}

#[inline]
pub fn triangle(phase: f64) -> f64 {
    2.0 * m_abs(2.0 * wrap_phase01(phase) - 1.0) - 1.0
}

/// One sample of `kind` at `phase` (cycles). `noise` is consulted only for
/// [`WaveformKind::Noise`], once per call.
#[inline]
pub fn generate<N: NoiseSource + ?Sized>(kind: WaveformKind, phase: f64, noise: &mut N) -> f64 {
    match kind {
        WaveformKind::Sine => sine(phase),
        WaveformKind::Square => square(phase),
        WaveformKind::Sawtooth => sawtooth(phase),
        WaveformKind::Triangle => triangle(phase),
        WaveformKind::Noise => noise.next_bipolar(),
    }
}

// ------------------------------------ Tests --------------------------------------
