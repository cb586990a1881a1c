//! Playback controller: one-shot effects, one looping music track, master
//! mute and separate music/effects volumes.
//!
//! All operations run synchronously on the caller's thread and return as
//! soon as the output has been told what to do; audio progresses on the
//! output's own clock. There is at most one music session at any time.

use chiptone_core::dsp::clamp_unit;
use chiptone_core::wave::NoiseSource;
use tracing::{debug, trace, warn};

use crate::bank::{shop_presets, BankFile, SoundBank};
use crate::buffer::SampleBuffer;
use crate::config::ControllerConfig;
use crate::error::SynthResult;
use crate::mixer::{PlaybackMode, SessionId};
use crate::music::MusicArrangement;
use crate::output::AudioOutput;

/// The background loop and its live session, if playing.
#[derive(Clone, Debug)]
pub struct MusicTrack {
    buffer: SampleBuffer,
    session: Option<SessionId>,
}

impl MusicTrack {
    pub fn new(buffer: SampleBuffer) -> Self {
        Self { buffer, session: None }
    }

    #[inline] pub fn buffer(&self) -> &SampleBuffer { &self.buffer }
    #[inline] pub fn is_playing(&self) -> bool { self.session.is_some() }
}

pub struct PlaybackController<O: AudioOutput> {
    output: O,
    bank: SoundBank,
    music: Option<MusicTrack>,
    music_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl<O: AudioOutput> PlaybackController<O> {
    /// Controller over prebuilt content.
    pub fn new(output: O, bank: SoundBank, music: Option<SampleBuffer>, config: ControllerConfig) -> Self {
        let config = config.clamped();
        Self {
            output,
            bank,
            music: music.map(MusicTrack::new),
            music_volume: config.music_volume,
            sfx_volume: config.sfx_volume,
            muted: config.muted,
        }
    }

    /// Build the shop presets and theme at the output's sample rate.
    pub fn with_shop_sounds<N: NoiseSource + ?Sized>(
        output: O,
        config: ControllerConfig,
        noise: &mut N,
    ) -> SynthResult<Self> {
        let sr = output.sample_rate();
        let bank = SoundBank::build(shop_presets()?, sr, noise)?;
        let music = MusicArrangement::shop_theme().build(sr)?;
        Ok(Self::new(output, bank, Some(music), config))
    }

    /// Build a bank file's sounds (and music, if any) at the output's rate.
    pub fn from_bank_file<N: NoiseSource + ?Sized>(
        output: O,
        file: &BankFile,
        config: ControllerConfig,
        noise: &mut N,
    ) -> SynthResult<Self> {
        let sr = output.sample_rate();
        let bank = SoundBank::build(file.sounds.iter().cloned(), sr, noise)?;
        let music = file.music.as_ref().map(|m| m.build(sr)).transpose()?;
        Ok(Self::new(output, bank, music, config))
    }

    // ------------------------------- Operations ----------------------------------

    /// Fire a one-shot effect at the current effects volume. Ignored while
    /// muted or when `name` is not in the bank.
    pub fn play_one_shot(&mut self, name: &str) {
        if self.muted {
            trace!(sound = name, "muted; one-shot suppressed");
            return;
        }
        let Some(buffer) = self.bank.buffer(name) else {
            trace!(sound = name, "unknown sound ignored");
            return;
        };
        let id = self.output.start(buffer, PlaybackMode::OneShot, self.sfx_volume);
        debug!(sound = name, session = id.get(), gain = self.sfx_volume, "one-shot started");
    }

    /// Start the music loop from the top, replacing any running music session.
    /// Ignored while muted or when no music was built.
    pub fn play_music(&mut self) {
        if self.muted {
            return;
        }
        if self.music.is_none() {
            warn!("play_music ignored: no music loop was built");
            return;
        }
        self.stop_music();
        let Some(track) = self.music.as_mut() else { return };
        let id = self.output.start(&track.buffer, PlaybackMode::Loop, self.music_volume);
        track.session = Some(id);
        debug!(session = id.get(), gain = self.music_volume, "music started");
    }

    /// Stop the music loop if it is playing.
    pub fn stop_music(&mut self) {
        let Some(id) = self.music.as_mut().and_then(|t| t.session.take()) else {
            return;
        };
        self.output.stop(id);
        debug!(session = id.get(), "music stopped");
    }

    /// Flip the master mute. Muting stops the music; unmuting restarts it.
    /// Returns the new mute state.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        if self.muted {
            self.stop_music();
        } else {
            self.play_music();
        }
        debug!(muted = self.muted, "mute toggled");
        self.muted
    }

    /// Set the music volume (clamped to `[0, 1]`), applied live to a playing loop.
    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = clamp_unit(volume);
        if let Some(id) = self.music.as_ref().and_then(|t| t.session) {
            self.output.set_gain(id, self.music_volume);
        }
    }

    /// Set the effects volume (clamped to `[0, 1]`) for one-shots started from now on.
    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = clamp_unit(volume);
    }

    // -------------------------------- Accessors ----------------------------------

    #[inline] pub fn is_muted(&self) -> bool { self.muted }
    #[inline] pub fn music_volume(&self) -> f32 { self.music_volume }
    #[inline] pub fn sfx_volume(&self) -> f32 { self.sfx_volume }
    #[inline] pub fn bank(&self) -> &SoundBank { &self.bank }
    #[inline] pub fn music(&self) -> Option<&MusicTrack> { self.music.as_ref() }
    #[inline] pub fn output(&self) -> &O { &self.output }

    pub fn is_music_playing(&self) -> bool {
        self.music.as_ref().is_some_and(MusicTrack::is_playing)
    }

    pub fn sound_names(&self) -> impl Iterator<Item = &str> {
        self.bank.names()
    }

    /// Give the output back, e.g. to tear the device down.
    pub fn into_output(self) -> O {
        self.output
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chiptone_core::wave::{Silence, WaveformKind};

    use crate::sound::SoundDefinition;

    #[derive(Debug, PartialEq)]
    enum Call {
        Start { len: usize, mode: PlaybackMode, gain: f32 },
        SetGain { id: u64, gain: f32 },
        Stop { id: u64 },
    }

    /// Output double that records every call and counts live sessions.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        live: Vec<u64>,
        next: u64,
    }

    impl AudioOutput for Recorder {
        fn sample_rate(&self) -> u32 { 8_000 }

        fn start(&mut self, buffer: &SampleBuffer, mode: PlaybackMode, gain: f32) -> SessionId {
            self.next += 1;
            self.calls.push(Call::Start { len: buffer.len(), mode, gain });
            if mode == PlaybackMode::Loop {
                self.live.push(self.next);
            }
            SessionId::new(self.next)
        }

        fn set_gain(&mut self, session: SessionId, gain: f32) {
            self.calls.push(Call::SetGain { id: session.get(), gain });
        }

        fn stop(&mut self, session: SessionId) {
            self.live.retain(|&id| id != session.get());
            self.calls.push(Call::Stop { id: session.get() });
        }
    }

    fn controller() -> PlaybackController<Recorder> {
        PlaybackController::with_shop_sounds(Recorder::default(), ControllerConfig::default(), &mut Silence).unwrap()
    }

    #[test]
    fn one_shot_uses_sfx_volume() {
        let mut c = controller();
        c.play_one_shot("select");
        assert_eq!(c.output().calls, [Call::Start { len: 800, mode: PlaybackMode::OneShot, gain: 0.5 }]);
    }

    #[test]
    fn unknown_or_muted_one_shots_are_dropped() {
        let mut c = controller();
        c.play_one_shot("fanfare");
        c.toggle_mute();
        c.play_one_shot("select");
        assert!(c.output().calls.is_empty());
    }

    #[test]
    fn play_music_twice_keeps_one_session() {
        let mut c = controller();
        c.play_music();
        c.play_music();
        let calls = &c.output().calls;
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], Call::Start { mode: PlaybackMode::Loop, .. }));
        assert_eq!(calls[1], Call::Stop { id: 1 });
        assert!(matches!(calls[2], Call::Start { mode: PlaybackMode::Loop, gain, .. } if gain == 0.3));
        assert_eq!(c.output().live, [2]);
        assert!(c.is_music_playing());
    }

    #[test]
    fn stop_music_is_idempotent() {
        let mut c = controller();
        c.stop_music();
        c.play_music();
        c.stop_music();
        c.stop_music();
        assert_eq!(c.output().calls.len(), 2);
        assert!(!c.is_music_playing());
    }

    #[test]
    fn mute_round_trip_restarts_music_and_keeps_volumes() {
        let mut c = controller();
        c.set_music_volume(0.6);
        c.set_sfx_volume(0.9);
        c.play_music();
        assert!(c.toggle_mute());
        assert!(!c.is_music_playing());
        assert!(c.output().live.is_empty());
        assert!(!c.toggle_mute());
        assert!(c.is_music_playing());
        assert_eq!(c.output().live.len(), 1);
        assert_eq!(c.music_volume(), 0.6);
        assert_eq!(c.sfx_volume(), 0.9);
    }

    #[test]
    fn volumes_are_clamped() {
        let mut c = controller();
        c.set_music_volume(1.5);
        assert_eq!(c.music_volume(), 1.0);
        c.set_music_volume(-0.2);
        assert_eq!(c.music_volume(), 0.0);
        c.set_sfx_volume(3.0);
        assert_eq!(c.sfx_volume(), 1.0);
    }

    #[test]
    fn music_volume_applies_live_sfx_volume_does_not() {
        let mut c = controller();
        c.set_music_volume(0.4);
        assert!(c.output().calls.is_empty(), "nothing playing, nothing to update");
        c.play_music();
        c.set_music_volume(0.8);
        assert_eq!(c.output().calls.last(), Some(&Call::SetGain { id: 1, gain: 0.8 }));
        let before = c.output().calls.len();
        c.set_sfx_volume(0.1);
        assert_eq!(c.output().calls.len(), before);
    }

    #[test]
    fn no_music_means_play_music_is_a_no_op() {
        let def = SoundDefinition::builder("blip", WaveformKind::Sine, 440.0).build().unwrap();
        let bank = SoundBank::build([def], 8_000, &mut Silence).unwrap();
        let mut c = PlaybackController::new(Recorder::default(), bank, None, ControllerConfig::default());
        c.play_music();
        assert!(c.toggle_mute());
        assert!(!c.toggle_mute());
        assert!(c.output().calls.is_empty());
        assert!(!c.is_music_playing());
    }

    #[test]
    fn starting_muted_suppresses_everything() {
        let cfg = ControllerConfig { muted: true, ..ControllerConfig::default() };
        let mut c = PlaybackController::with_shop_sounds(Recorder::default(), cfg, &mut Silence).unwrap();
        c.play_music();
        c.play_one_shot("buy");
        assert!(c.output().calls.is_empty());
        assert!(!c.toggle_mute());
        assert!(c.is_music_playing());
    }
}
