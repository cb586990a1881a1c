//! Amplitude envelopes evaluated as pure functions of elapsed time.
//!
//! Provided envelopes:
//! - `EnvelopeParams` : four-phase ADSR over the whole life of a one-shot sound
//! - `NoteEnvelope`   : attack/release ramp around a single sequenced note
//!
//! Both are stateless: the caller passes the time since the sound (or note)
//! started and the total length, and gets a gain in `[0, 1]` back. Times are
//! in **seconds**.

use crate::dsp::clamp;

/// Sustain level used when a definition leaves it unset.
pub const DEFAULT_SUSTAIN: f64 = 0.7;

// ---------------------------------- ADSR -----------------------------------------

/// Attack / decay / sustain / release parameters for a one-shot sound.
///
/// The phases are evaluated in a fixed order, first match wins:
/// attack, decay, release, sustain. On a sound shorter than
/// `attack + decay` the release ramp is therefore never reached.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self { attack: 0.0, decay: 0.0, sustain: DEFAULT_SUSTAIN, release: 0.0 }
    }
}

impl EnvelopeParams {
    #[inline]
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self { attack, decay, sustain, release }
    }

    /// Times finite and non-negative, sustain within `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        let time_ok = |t: f64| t.is_finite() && t >= 0.0;
        time_ok(self.attack)
            && time_ok(self.decay)
            && time_ok(self.release)
            && self.sustain.is_finite()
            && (0.0..=1.0).contains(&self.sustain)
    }

    /// Gain at `t` seconds into a sound lasting `total` seconds.
    #[inline]
    pub fn amplitude(&self, t: f64, total: f64) -> f64 {
        let EnvelopeParams { attack, decay, sustain, release } = *self;

        if attack > 0.0 && t < attack {
            return t / attack;
        }
        if decay > 0.0 && t < attack + decay {
            return 1.0 - (1.0 - sustain) * ((t - attack) / decay);
        }
        if release > 0.0 && t > total - release {
            let v = (1.0 - (t - (total - release)) / release) * sustain;
            return clamp(v, 0.0, sustain);
        }
        sustain
    }
}

/// Free-function form of [`EnvelopeParams::amplitude`].
#[inline]
pub fn amplitude(t: f64, params: &EnvelopeParams, total: f64) -> f64 {
    params.amplitude(t, total)
}

// ------------------------------- Note envelope -----------------------------------

/// Linear fade-in / fade-out around a sequenced note, flat `1.0` in between.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NoteEnvelope {
    pub attack: f64,
    pub release: f64,
}

impl NoteEnvelope {
    #[inline]
    pub const fn new(attack: f64, release: f64) -> Self {
        Self { attack, release }
    }

    /// Gain at `t` seconds into a note lasting `duration` seconds.
    #[inline]
    pub fn amplitude(&self, t: f64, duration: f64) -> f64 {
        if self.attack > 0.0 && t < self.attack {
            t / self.attack
        } else if self.release > 0.0 && t > duration - self.release {
            clamp((duration - t) / self.release, 0.0, 1.0)
        } else {
            1.0
        }
    }
}

// ------------------------------------ Tests --------------------------------------
