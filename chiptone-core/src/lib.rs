#![cfg_attr(not(feature = "std"), no_std)]
//! Chiptone Core: no_std-ready primitives for retro one-shot and music synthesis.
//!
//! Features
//! - `std`      : (default) use the Rust standard library
//! - `no-std`   : build with `#![no_std]` and use the `libm` math backend
//!
//! Modules
//! - [`dsp`]       : math backend, clamping, sign, phase wrap, peak/normalize helpers
//! - [`wave`]      : waveform kinds, per-phase generators, injectable noise sources
//! - [`envelopes`] : four-phase ADSR and per-note attack/release envelopes
//! - [`notes`]     : pitch-name lookup table (octaves 3–5)
//!
//! Design
//! - No heap allocations; everything is a pure function of its inputs
//! - Phase is measured in cycles (`time * frequency`), never radians
//! - Randomness only enters through [`wave::NoiseSource`]

pub mod dsp;
pub mod envelopes;
pub mod notes;
pub mod wave;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::dsp::{clamp, clamp_unit, normalize_peak, peak_abs, sample_count, sign, TAU};
    pub use crate::envelopes::{amplitude, EnvelopeParams, NoteEnvelope, DEFAULT_SUSTAIN};
    pub use crate::notes::note_frequency;
    pub use crate::wave::{generate, NoiseSource, SequenceNoise, Silence, WaveformKind};
}
