//! The audio-output seam the playback controller talks to.
//!
//! An output can start independent sessions from immutable buffers (looping
//! or not), adjust a session's gain while it plays, and stop it. Sessions
//! that end on their own simply disappear; stopping one that is already gone
//! is a no-op.

use crate::buffer::SampleBuffer;
use crate::mixer::{Mixer, PlaybackMode, SessionId, SharedMixer};

pub trait AudioOutput {
    /// Rate that buffers should be built at for this output.
    fn sample_rate(&self) -> u32;

    /// Start a new, independent session. Never blocks on playback.
    fn start(&mut self, buffer: &SampleBuffer, mode: PlaybackMode, gain: f32) -> SessionId;

    /// Apply `gain` to a live session without restarting it.
    fn set_gain(&mut self, session: SessionId, gain: f32);

    /// Terminate a session.
    fn stop(&mut self, session: SessionId);
}

impl AudioOutput for Mixer {
    fn sample_rate(&self) -> u32 {
        crate::graph::Generator::sample_rate(self)
    }

    fn start(&mut self, buffer: &SampleBuffer, mode: PlaybackMode, gain: f32) -> SessionId {
        Mixer::start(self, buffer, mode, gain)
    }

    fn set_gain(&mut self, session: SessionId, gain: f32) {
        Mixer::set_gain(self, session, gain);
    }

    fn stop(&mut self, session: SessionId) {
        Mixer::stop(self, session);
    }
}

impl AudioOutput for SharedMixer {
    fn sample_rate(&self) -> u32 {
        crate::graph::Generator::sample_rate(&*self.lock())
    }

    fn start(&mut self, buffer: &SampleBuffer, mode: PlaybackMode, gain: f32) -> SessionId {
        self.lock().start(buffer, mode, gain)
    }

    fn set_gain(&mut self, session: SessionId, gain: f32) {
        self.lock().set_gain(session, gain);
    }

    fn stop(&mut self, session: SessionId) {
        self.lock().stop(session);
    }
}

impl<O: AudioOutput + ?Sized> AudioOutput for Box<O> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn start(&mut self, buffer: &SampleBuffer, mode: PlaybackMode, gain: f32) -> SessionId {
        (**self).start(buffer, mode, gain)
    }

    fn set_gain(&mut self, session: SessionId, gain: f32) {
        (**self).set_gain(session, gain);
    }

    fn stop(&mut self, session: SessionId) {
        (**self).stop(session);
    }
}
