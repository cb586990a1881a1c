//! Named sound definitions with their rendered buffers.
//!
//! The bank is built once (at startup or when a bank file is loaded) and is
//! read-only afterwards; lookups hand out cheap clones of the buffers.

use std::collections::BTreeMap;
use std::path::Path;

use chiptone_core::wave::{NoiseSource, WaveformKind};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::buffer::SampleBuffer;
use crate::error::{SynthError, SynthResult};
use crate::music::MusicArrangement;
use crate::sound::{build_sound, FrequencyStep, SoundDefinition};

/// A definition together with the buffer rendered from it.
#[derive(Clone, Debug)]
pub struct BankEntry {
    pub definition: SoundDefinition,
    pub buffer: SampleBuffer,
}

/// Sound buffers keyed by unique name.
#[derive(Clone, Debug, Default)]
pub struct SoundBank {
    sample_rate: u32,
    entries: BTreeMap<String, BankEntry>,
}

impl SoundBank {
    /// Render every definition at `sample_rate`. Names must be unique.
    pub fn build<N: NoiseSource + ?Sized>(
        definitions: impl IntoIterator<Item = SoundDefinition>,
        sample_rate: u32,
        noise: &mut N,
    ) -> SynthResult<Self> {
        let mut entries = BTreeMap::new();
        for definition in definitions {
            if entries.contains_key(definition.name()) {
                return Err(SynthError::DuplicateSound(definition.name().to_owned()));
            }
            let buffer = build_sound(&definition, sample_rate, noise)?;
            entries.insert(definition.name().to_owned(), BankEntry { definition, buffer });
        }
        info!(sounds = entries.len(), sample_rate, "sound bank ready");
        Ok(Self { sample_rate, entries })
    }

    #[inline] pub fn sample_rate(&self) -> u32 { self.sample_rate }
    #[inline] pub fn len(&self) -> usize { self.entries.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, name: &str) -> Option<&BankEntry> {
        self.entries.get(name)
    }

    pub fn buffer(&self, name: &str) -> Option<&SampleBuffer> {
        self.entries.get(name).map(|e| &e.buffer)
    }

    /// Sound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// ---------------------------------- Presets --------------------------------------

/// The six interface sounds of the shop: all square waves with a short
/// attack, sustain at its default and no release ramp.
pub fn shop_presets() -> SynthResult<Vec<SoundDefinition>> {
    let sq = |name: &str, freq: f64, duration: f64, decay: f64, volume: f64| {
        SoundDefinition::builder(name, WaveformKind::Square, freq)
            .duration(duration)
            .attack_decay(0.01, decay)
            .volume(volume)
    };
    let steps = |pairs: &[(f64, f64)]| -> Vec<FrequencyStep> {
        pairs.iter().map(|&(f, t)| FrequencyStep::new(f, t)).collect()
    };

    Ok(vec![
        sq("select", 440.0, 0.1, 0.1, 0.3).build()?,
        sq("confirm", 660.0, 0.2, 0.1, 0.3)
            .steps(steps(&[(440.0, 0.0), (660.0, 0.1)]))
            .build()?,
        sq("cancel", 220.0, 0.2, 0.1, 0.3)
            .steps(steps(&[(330.0, 0.0), (220.0, 0.1)]))
            .build()?,
        sq("navigate", 330.0, 0.05, 0.05, 0.2).build()?,
        sq("buy", 660.0, 0.5, 0.5, 0.3)
            .steps(steps(&[(440.0, 0.0), (554.0, 0.1), (660.0, 0.2), (880.0, 0.3)]))
            .build()?,
        sq("error", 110.0, 0.3, 0.3, 0.3)
            .steps(steps(&[(220.0, 0.0), (110.0, 0.1)]))
            .build()?,
    ])
}

// --------------------------------- Bank files ------------------------------------

/// On-disk bank: sound definitions plus an optional music arrangement.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankFile {
    pub sounds: Vec<SoundDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicArrangement>,
}

impl BankFile {
    /// The built-in shop presets and theme.
    pub fn shop() -> SynthResult<Self> {
        Ok(Self { sounds: shop_presets()?, music: Some(MusicArrangement::shop_theme()) })
    }

    pub fn from_json(text: &str) -> SynthResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> SynthResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chiptone_core::wave::Silence;

    #[test]
    fn presets_build_into_a_bank() {
        let bank = SoundBank::build(shop_presets().unwrap(), 44_100, &mut Silence).unwrap();
        let names: Vec<_> = bank.names().collect();
        assert_eq!(names, ["buy", "cancel", "confirm", "error", "navigate", "select"]);
        assert_eq!(bank.buffer("navigate").unwrap().len(), 2_205);
        assert_eq!(bank.buffer("buy").unwrap().len(), 22_050);
        assert!(bank.get("missing").is_none());
    }

    #[test]
    fn buy_climbs_through_four_steps() {
        let presets = shop_presets().unwrap();
        let buy = presets.iter().find(|d| d.name() == "buy").unwrap();
        let got: Vec<f64> = [0.05, 0.15, 0.25, 0.45].iter().map(|&t| buy.active_frequency(t)).collect();
        assert_eq!(got, [440.0, 554.0, 660.0, 880.0]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let a = SoundDefinition::builder("blip", WaveformKind::Sine, 440.0).build().unwrap();
        let b = SoundDefinition::builder("blip", WaveformKind::Square, 880.0).build().unwrap();
        assert!(matches!(
            SoundBank::build([a, b], 8_000, &mut Silence),
            Err(SynthError::DuplicateSound(n)) if n == "blip"
        ));
    }

    #[test]
    fn bank_file_round_trips_through_json() {
        let shop = BankFile::shop().unwrap();
        let text = serde_json::to_string_pretty(&shop).unwrap();
        let back = BankFile::from_json(&text).unwrap();
        assert_eq!(back.sounds, shop.sounds);
        assert_eq!(back.music, shop.music);
    }

    #[test]
    fn bank_file_rejects_bad_entries() {
        let text = r#"{ "sounds": [{ "name": "x", "frequency": -5 }] }"#;
        assert!(matches!(BankFile::from_json(text), Err(SynthError::Json(_))));
    }
}
