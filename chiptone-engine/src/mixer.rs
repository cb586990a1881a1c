//! Additive mixer over live playback sessions.
//!
//! Each session reads one [`SampleBuffer`] at its own gain. One-shot sessions
//! disappear when their buffer runs out; looping sessions wrap until stopped.
//! Buffers whose rate differs from the mixer's are read with a fractional
//! playhead and linear interpolation.
//!
//! [`SharedMixer`] puts a mixer behind `Arc<Mutex<_>>` so the control side and
//! the audio callback can both reach it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::buffer::SampleBuffer;
use crate::error::{check_sample_rate, SynthResult};
use crate::graph::Generator;

/// Handle to one playback session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw id. Outputs other than [`Mixer`] mint their own.
    #[inline] pub const fn new(raw: u64) -> Self { Self(raw) }
    #[inline] pub fn get(self) -> u64 { self.0 }
}

/// How a session ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Play the buffer once, then drop the session.
    OneShot,
    /// Wrap to the start until stopped.
    Loop,
}

#[derive(Clone, Debug)]
struct Session {
    id: SessionId,
    buffer: SampleBuffer,
    mode: PlaybackMode,
    gain: f32,
    pos: f64,  // playhead in source samples
    step: f64, // source samples per output sample
}

impl Session {
    /// Current interpolated sample, or `None` once a one-shot has run out.
    #[inline]
    fn read(&self) -> Option<f32> {
        let data = self.buffer.samples();
        if data.is_empty() {
            return match self.mode {
                PlaybackMode::OneShot => None,
                PlaybackMode::Loop => Some(0.0),
            };
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = self.pos as usize;
        if idx >= data.len() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let frac = (self.pos - idx as f64) as f32;
        let s1 = data[idx];
        let s2 = match data.get(idx + 1) {
            Some(&s) => s,
            None if self.mode == PlaybackMode::Loop => data[0],
            None => s1,
        };
        Some(s1 + (s2 - s1) * frac)
    }

    /// Advance the playhead; returns `false` when a one-shot has finished.
    #[inline]
    fn advance(&mut self) -> bool {
        let len = self.buffer.len() as f64;
        self.pos += self.step;
        if self.pos < len {
            return true;
        }
        match self.mode {
            PlaybackMode::OneShot => false,
            PlaybackMode::Loop if len > 0.0 => {
                self.pos %= len;
                true
            }
            PlaybackMode::Loop => {
                self.pos = 0.0;
                true
            }
        }
    }
}

/// Sums every active session into one mono output stream.
#[derive(Clone, Debug)]
pub struct Mixer {
    sample_rate: u32,
    sessions: Vec<Session>,
    next_id: u64,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> SynthResult<Self> {
        check_sample_rate(sample_rate)?;
        Ok(Self { sample_rate, sessions: Vec::new(), next_id: 1 })
    }

    /// Begin playing `buffer` from its first sample.
    pub fn start(&mut self, buffer: &SampleBuffer, mode: PlaybackMode, gain: f32) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        let step = f64::from(buffer.sample_rate()) / f64::from(self.sample_rate);
        self.sessions.push(Session {
            id,
            buffer: buffer.clone(),
            mode,
            gain,
            pos: 0.0,
            step,
        });
        trace!(session = id.0, ?mode, gain, "session started");
        id
    }

    /// Change a live session's gain. Returns `false` if it is no longer active.
    pub fn set_gain(&mut self, id: SessionId, gain: f32) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.gain = gain;
                true
            }
            None => false,
        }
    }

    /// End a session now. Returns `false` if it had already ended.
    pub fn stop(&mut self, id: SessionId) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        before != self.sessions.len()
    }

    /// Drop every session, one-shots included.
    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    #[inline] pub fn is_active(&self, id: SessionId) -> bool { self.sessions.iter().any(|s| s.id == id) }
    #[inline] pub fn active_count(&self) -> usize { self.sessions.len() }

    /// Current gain of a live session.
    pub fn gain(&self, id: SessionId) -> Option<f32> {
        self.sessions.iter().find(|s| s.id == id).map(|s| s.gain)
    }
}

impl Generator for Mixer {
    #[inline]
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next(&mut self) -> f32 {
        let mut out = 0.0;
        let mut i = 0;
        while i < self.sessions.len() {
            let session = &mut self.sessions[i];
            let alive = match session.read() {
                Some(s) => {
                    out += s * session.gain;
                    session.advance()
                }
                None => false,
            };
            if alive {
                i += 1;
            } else {
                // order between sessions carries no meaning
                let done = self.sessions.swap_remove(i);
                trace!(session = done.id.0, "session finished");
            }
        }
        out
    }
}

// ---------------------------------- Shared ---------------------------------------

/// A [`Mixer`] shared between the control thread and the audio callback.
#[derive(Clone, Debug)]
pub struct SharedMixer(Arc<Mutex<Mixer>>);

impl SharedMixer {
    pub fn new(sample_rate: u32) -> SynthResult<Self> {
        Ok(Self(Arc::new(Mutex::new(Mixer::new(sample_rate)?))))
    }

    /// Lock the mixer. A panic on another thread while holding the lock does
    /// not leave the mixer in a torn state, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, Mixer> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render mono samples into `out`.
    pub fn render(&self, out: &mut [f32]) {
        self.lock().render(out);
    }

    /// Render interleaved samples, duplicating mono into each channel.
    pub fn render_interleaved(&self, out: &mut [f32], channels: usize) {
        self.lock().render_interleaved(out, channels);
    }
}

// ------------------------------------ Tests --------------------------------------
