//! Chiptone Engine: sound and music buffer builders, mixer and playback control.
//!
//! Crate layout:
//! - [`sound`]      : sound definitions and the one-shot buffer builder
//! - [`music`]      : note events, lead/bass voices and the looping music builder
//! - [`bank`]       : named, prebuilt sound buffers plus the shop presets
//! - [`mixer`]      : additive session mixer (`Generator`), optionally shared
//! - [`output`]     : `AudioOutput` trait the controller drives
//! - [`controller`] : one-shots, music loop, mute and volume state
//! - [`realtime`]   : CPAL device output (feature `realtime`)
//!
//! Buffers are built once, up front; playback only reads them. Nothing on the
//! render path allocates except when a session is started.

pub mod bank;
pub mod buffer;
pub mod config;
pub mod controller;
pub mod error;
pub mod graph;
pub mod mixer;
pub mod music;
pub mod output;
pub mod rng;
pub mod sound;

#[cfg(feature = "realtime")]
pub mod realtime;

pub use bank::{shop_presets, BankFile, SoundBank};
pub use buffer::SampleBuffer;
pub use config::ControllerConfig;
pub use controller::PlaybackController;
pub use error::{SynthError, SynthResult};
pub use graph::Generator;
pub use mixer::{Mixer, PlaybackMode, SessionId, SharedMixer};
pub use music::{build_music, MusicArrangement, NoteEvent};
pub use output::AudioOutput;
pub use rng::{SeededNoise, ThreadNoise};
pub use sound::{build_sound, FrequencyStep, SoundDefinition};

#[cfg(feature = "realtime")]
pub use realtime::{list_output_devices, CpalOutput, OutputOptions};
