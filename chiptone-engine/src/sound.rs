//! One-shot sound definitions and the buffer builder that renders them.
//!
//! A [`SoundDefinition`] is validated once, with every optional field already
//! resolved to its default, and is immutable afterwards. [`build_sound`] turns
//! it into a [`SampleBuffer`] sample by sample:
//!
//! ```text
//! t      = i / sample_rate
//! freq   = last step (scanning backward) with step.time <= t, else base frequency
//! s[i]   = wave(t * freq) * envelope(t) * volume
//! ```
//!
//! One-shot buffers are never normalized.

use chiptone_core::dsp::sample_count;
use chiptone_core::envelopes::{EnvelopeParams, DEFAULT_SUSTAIN};
use chiptone_core::wave::{generate, NoiseSource, WaveformKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::SampleBuffer;
use crate::error::{check_duration, check_frequency, check_sample_rate, SynthError, SynthResult};

/// Duration used when a bank entry omits one.
pub const DEFAULT_DURATION: f64 = 0.2;

/// A pitch change taking effect `time` seconds into the sound.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencyStep {
    pub frequency: f64,
    pub time: f64,
}

impl FrequencyStep {
    #[inline]
    pub const fn new(frequency: f64, time: f64) -> Self {
        Self { frequency, time }
    }
}

/// Frequency in effect at `t`: the last step by position, scanning backward,
/// whose `time <= t`. Falls back to `base` when none qualifies.
///
/// Steps are not required to be sorted.
#[inline]
pub fn active_frequency(steps: &[FrequencyStep], base: f64, t: f64) -> f64 {
    steps
        .iter()
        .rev()
        .find(|s| s.time <= t)
        .map_or(base, |s| s.frequency)
}

// ------------------------------ Sound definition ---------------------------------

/// Immutable description of a one-shot sound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SoundSpec", into = "SoundSpec")]
pub struct SoundDefinition {
    name: String,
    waveform: WaveformKind,
    base_frequency: f64,
    duration: f64,
    envelope: EnvelopeParams,
    volume: f64,
    steps: Vec<FrequencyStep>,
}

impl SoundDefinition {
    /// Start a definition; everything not set on the builder takes its default.
    pub fn builder(
        name: impl Into<String>,
        waveform: WaveformKind,
        base_frequency: f64,
    ) -> SoundDefinitionBuilder {
        SoundDefinitionBuilder {
            name: name.into(),
            waveform,
            base_frequency,
            duration: DEFAULT_DURATION,
            envelope: EnvelopeParams::default(),
            volume: 1.0,
            steps: Vec::new(),
        }
    }

    #[inline] pub fn name(&self) -> &str { &self.name }
    #[inline] pub fn waveform(&self) -> WaveformKind { self.waveform }
    #[inline] pub fn base_frequency(&self) -> f64 { self.base_frequency }
    #[inline] pub fn duration(&self) -> f64 { self.duration }
    #[inline] pub fn envelope(&self) -> &EnvelopeParams { &self.envelope }
    #[inline] pub fn volume(&self) -> f64 { self.volume }
    #[inline] pub fn steps(&self) -> &[FrequencyStep] { &self.steps }

    /// Frequency in effect `t` seconds into this sound.
    #[inline]
    pub fn active_frequency(&self, t: f64) -> f64 {
        active_frequency(&self.steps, self.base_frequency, t)
    }
}

/// Builder for [`SoundDefinition`]; validation happens in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct SoundDefinitionBuilder {
    name: String,
    waveform: WaveformKind,
    base_frequency: f64,
    duration: f64,
    envelope: EnvelopeParams,
    volume: f64,
    steps: Vec<FrequencyStep>,
}

impl SoundDefinitionBuilder {
    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn envelope(mut self, envelope: EnvelopeParams) -> Self {
        self.envelope = envelope;
        self
    }

    /// Shorthand for an envelope with only attack and decay set
    /// (sustain at its default, no release).
    pub fn attack_decay(mut self, attack: f64, decay: f64) -> Self {
        self.envelope = EnvelopeParams::new(attack, decay, DEFAULT_SUSTAIN, 0.0);
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = FrequencyStep>) -> Self {
        self.steps = steps.into_iter().collect();
        self
    }

    pub fn build(self) -> SynthResult<SoundDefinition> {
        if self.name.trim().is_empty() {
            return Err(SynthError::invalid_param("name", "must not be empty"));
        }
        check_frequency(self.base_frequency)?;
        check_duration(self.duration)?;
        if !self.envelope.is_valid() {
            return Err(SynthError::invalid_param(
                "envelope",
                format!(
                    "times must be finite and >= 0, sustain within [0, 1] (got {:?})",
                    self.envelope
                ),
            ));
        }
        if !self.volume.is_finite() {
            return Err(SynthError::invalid_param("volume", "must be finite"));
        }
        for step in &self.steps {
            check_frequency(step.frequency)?;
            if !step.time.is_finite() || step.time < 0.0 {
                return Err(SynthError::invalid_param(
                    "steps",
                    format!("step time must be finite and >= 0 (got {})", step.time),
                ));
            }
        }

        let steps = if self.steps.is_empty() {
            vec![FrequencyStep::new(self.base_frequency, 0.0)]
        } else {
            self.steps
        };

        Ok(SoundDefinition {
            name: self.name,
            waveform: self.waveform,
            base_frequency: self.base_frequency,
            duration: self.duration,
            envelope: self.envelope,
            volume: self.volume,
            steps,
        })
    }
}

// --------------------------------- Bank file form --------------------------------

/// Serialized shape of a sound definition, as found in bank files.
///
/// Optional fields are filled in when converting to [`SoundDefinition`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SoundSpec {
    pub name: String,
    #[serde(default, alias = "type", with = "waveform_name")]
    pub waveform: WaveformKind,
    #[serde(alias = "baseFrequency")]
    pub frequency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub attack: f64,
    #[serde(default)]
    pub decay: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustain: Option<f64>,
    #[serde(default)]
    pub release: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<FrequencyStep>,
}

impl TryFrom<SoundSpec> for SoundDefinition {
    type Error = SynthError;

    fn try_from(spec: SoundSpec) -> SynthResult<Self> {
        let envelope = EnvelopeParams::new(
            spec.attack,
            spec.decay,
            spec.sustain.unwrap_or(DEFAULT_SUSTAIN),
            spec.release,
        );
        SoundDefinition::builder(spec.name, spec.waveform, spec.frequency)
            .duration(spec.duration.unwrap_or(DEFAULT_DURATION))
            .envelope(envelope)
            .volume(spec.volume.unwrap_or(1.0))
            .steps(spec.steps)
            .build()
    }
}

impl From<SoundDefinition> for SoundSpec {
    fn from(def: SoundDefinition) -> Self {
        Self {
            name: def.name,
            waveform: def.waveform,
            frequency: def.base_frequency,
            duration: Some(def.duration),
            attack: def.envelope.attack,
            decay: def.envelope.decay,
            sustain: Some(def.envelope.sustain),
            release: def.envelope.release,
            volume: Some(def.volume),
            steps: def.steps,
        }
    }
}

mod waveform_name {
    use chiptone_core::wave::WaveformKind;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(kind: &WaveformKind, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(kind.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<WaveformKind, D::Error> {
        let name = String::deserialize(d)?;
        name.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------- Builder --------------------------------------

/// Render `def` into a mono buffer of `ceil(duration * sample_rate)` samples.
///
/// `noise` is only drawn from for [`WaveformKind::Noise`]; for every other
/// waveform the result is bit-identical across calls.
pub fn build_sound<N: NoiseSource + ?Sized>(
    def: &SoundDefinition,
    sample_rate: u32,
    noise: &mut N,
) -> SynthResult<SampleBuffer> {
    check_sample_rate(sample_rate)?;

    let sr = f64::from(sample_rate);
    let len = sample_count(def.duration, sample_rate);
    let mut samples = Vec::with_capacity(len);

    for i in 0..len {
        let t = i as f64 / sr;
        let freq = def.active_frequency(t);
        let wave = generate(def.waveform, t * freq, noise);
        let env = def.envelope.amplitude(t, def.duration);
        #[allow(clippy::cast_possible_truncation)]
        let s = (wave * env * def.volume) as f32;
        samples.push(s);
    }

    debug!(
        sound = def.name(),
        waveform = %def.waveform,
        samples = len,
        sample_rate,
        "built sound buffer"
    );
    SampleBuffer::new(samples, sample_rate)
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chiptone_core::wave::{SequenceNoise, Silence};

    fn confirm() -> SoundDefinition {
        SoundDefinition::builder("confirm", WaveformKind::Square, 660.0)
            .duration(0.2)
            .attack_decay(0.01, 0.1)
            .volume(0.3)
            .steps([FrequencyStep::new(440.0, 0.0), FrequencyStep::new(660.0, 0.1)])
            .build()
            .unwrap()
    }

    #[test]
    fn step_resolution_picks_latest_started_step() {
        let def = confirm();
        assert_eq!(def.active_frequency(0.05), 440.0);
        assert_eq!(def.active_frequency(0.1), 660.0);
        assert_eq!(def.active_frequency(0.15), 660.0);
    }

    #[test]
    fn step_resolution_scans_by_position_not_time() {
        // unsorted: the later array entry wins whenever it has started
        let steps = [FrequencyStep::new(660.0, 0.1), FrequencyStep::new(440.0, 0.0)];
        assert_eq!(active_frequency(&steps, 100.0, 0.05), 440.0);
        assert_eq!(active_frequency(&steps, 100.0, 0.15), 440.0);
        // nothing started yet: base frequency
        let late = [FrequencyStep::new(880.0, 0.3)];
        assert_eq!(active_frequency(&late, 100.0, 0.1), 100.0);
    }

    #[test]
    fn defaults_are_resolved_at_construction() {
        let def = SoundDefinition::builder("select", WaveformKind::Square, 440.0)
            .build()
            .unwrap();
        assert_eq!(def.duration(), DEFAULT_DURATION);
        assert_eq!(def.envelope().sustain, DEFAULT_SUSTAIN);
        assert_eq!(def.volume(), 1.0);
        assert_eq!(def.steps(), &[FrequencyStep::new(440.0, 0.0)]);
    }

    #[test]
    fn invalid_definitions_are_rejected() {
        let b = || SoundDefinition::builder("x", WaveformKind::Sine, 440.0);
        assert!(matches!(b().duration(0.0).build(), Err(SynthError::InvalidDuration { .. })));
        assert!(matches!(
            SoundDefinition::builder("x", WaveformKind::Sine, -1.0).build(),
            Err(SynthError::InvalidFrequency { .. })
        ));
        assert!(b().envelope(EnvelopeParams::new(0.0, 0.0, 1.2, 0.0)).build().is_err());
        assert!(b().steps([FrequencyStep::new(440.0, -0.1)]).build().is_err());
        assert!(b().volume(f64::NAN).build().is_err());
        assert!(SoundDefinition::builder(" ", WaveformKind::Sine, 440.0).build().is_err());
    }

    #[test]
    fn buffer_length_tracks_duration() {
        for (sr, dur) in [(44_100_u32, 0.1), (48_000, 0.2), (22_050, 0.05), (44_100, 0.5)] {
            let def = SoundDefinition::builder("len", WaveformKind::Triangle, 330.0)
                .duration(dur)
                .build()
                .unwrap();
            let buf = build_sound(&def, sr, &mut Silence).unwrap();
            let expected = (dur * f64::from(sr)).round() as i64;
            assert!((buf.len() as i64 - expected).abs() <= 1, "sr={sr} dur={dur} len={}", buf.len());
            assert_eq!(buf.sample_rate(), sr);
        }
    }

    #[test]
    fn samples_follow_the_formula() {
        let def = confirm();
        let sr = 8_000;
        let buf = build_sound(&def, sr, &mut Silence).unwrap();
        for i in [0_usize, 40, 79, 80, 400, 799, 801, 1_200, 1_599] {
            let t = i as f64 / f64::from(sr);
            let f = if t >= 0.1 { 660.0 } else { 440.0 };
            let env = def.envelope().amplitude(t, 0.2);
            let want = (chiptone_core::wave::square(t * f) * env * 0.3) as f32;
            assert_eq!(buf.samples()[i], want, "i={i}");
        }
        assert_eq!(buf.samples()[0], 0.0);
        assert!(buf.peak() <= 0.3 + 1e-6);
    }

    #[test]
    fn periodic_builds_are_bit_identical() {
        let def = confirm();
        let a = build_sound(&def, 44_100, &mut Silence).unwrap();
        let b = build_sound(&def, 44_100, &mut Silence).unwrap();
        assert_eq!(a.samples(), b.samples());
    }

    #[test]
    fn noise_sound_scales_injected_values() {
        let def = SoundDefinition::builder("hiss", WaveformKind::Noise, 1.0)
            .duration(0.01)
            .volume(0.5)
            .build()
            .unwrap();
        let values = [1.0, -1.0];
        let buf = build_sound(&def, 1_000, &mut SequenceNoise::new(&values)).unwrap();
        // flat sustain of 0.7, volume 0.5
        assert_eq!(buf.len(), 10);
        for (i, s) in buf.samples().iter().enumerate() {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            assert!((s - sign * 0.35).abs() < 1e-6, "i={i} s={s}");
        }
    }

    #[test]
    fn zero_sample_rate_is_a_config_error() {
        assert!(matches!(
            build_sound(&confirm(), 0, &mut Silence),
            Err(SynthError::InvalidSampleRate { rate: 0 })
        ));
    }

    #[test]
    fn bank_file_form_fills_defaults() {
        let json = r#"{ "name": "blip", "type": "triangle", "frequency": 880, "attack": 0.005 }"#;
        let def: SoundDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.waveform(), WaveformKind::Triangle);
        assert_eq!(def.duration(), DEFAULT_DURATION);
        assert_eq!(def.envelope().sustain, DEFAULT_SUSTAIN);
        assert_eq!(def.steps(), &[FrequencyStep::new(880.0, 0.0)]);

        let bad = r#"{ "name": "blip", "frequency": 880, "sustain": 3.0 }"#;
        assert!(serde_json::from_str::<SoundDefinition>(bad).is_err());
        let unknown_wave = r#"{ "name": "blip", "type": "pulse", "frequency": 880 }"#;
        assert!(serde_json::from_str::<SoundDefinition>(unknown_wave).is_err());
    }
}
