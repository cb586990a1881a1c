//! Playback controller settings.

use chiptone_core::dsp::clamp_unit;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MUSIC_VOLUME: f32 = 0.3;
pub const DEFAULT_SFX_VOLUME: f32 = 0.5;

/// Initial volumes and mute state. Volumes are clamped to `[0, 1]` when the
/// controller applies them.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            music_volume: DEFAULT_MUSIC_VOLUME,
            sfx_volume: DEFAULT_SFX_VOLUME,
            muted: false,
        }
    }
}

impl ControllerConfig {
    /// Copy with both volumes clamped into range.
    pub fn clamped(self) -> Self {
        Self {
            music_volume: clamp_unit(self.music_volume),
            sfx_volume: clamp_unit(self.sfx_volume),
            ..self
        }
    }
}
