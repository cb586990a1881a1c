//! Immutable mono sample buffers.
//!
//! A [`SampleBuffer`] is produced once by a builder and then shared by any
//! number of playback sessions. Cloning only bumps a reference count.

use std::path::Path;
use std::sync::Arc;

use crate::error::{check_sample_rate, SynthResult};

/// Fixed-length mono `f32` samples at a fixed rate.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wrap already-rendered samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> SynthResult<Self> {
        check_sample_rate(sample_rate)?;
        Ok(Self { samples: samples.into(), sample_rate })
    }

    #[inline] pub fn samples(&self) -> &[f32] { &self.samples }
    #[inline] pub fn len(&self) -> usize { self.samples.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.samples.is_empty() }
    #[inline] pub fn sample_rate(&self) -> u32 { self.sample_rate }

    /// Length in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Largest absolute sample value.
    #[inline]
    pub fn peak(&self) -> f32 {
        chiptone_core::dsp::peak_abs(&self.samples)
    }

    /// `true` when both buffers hold the same allocation.
    #[inline]
    pub fn shares_storage(&self, other: &SampleBuffer) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
    }

    /// Write the buffer as a mono 16-bit PCM WAV file. Samples are clipped to
    /// `[-1, 1]` before quantizing.
    pub fn write_wav(&self, path: impl AsRef<Path>) -> SynthResult<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &s in self.samples.iter() {
            #[allow(clippy::cast_possible_truncation)]
            let q = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
            writer.write_sample(q)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthError;

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(
            SampleBuffer::new(vec![0.0; 4], 0),
            Err(SynthError::InvalidSampleRate { rate: 0 })
        ));
    }

    #[test]
    fn clones_share_storage() {
        let a = SampleBuffer::new(vec![0.25, -0.5, 0.1], 8_000).unwrap();
        let b = a.clone();
        assert!(a.shares_storage(&b));
        assert_eq!(a.len(), 3);
        assert_eq!(a.peak(), 0.5);
        assert!((a.duration() - 3.0 / 8_000.0).abs() < 1e-12);
    }

    #[test]
    fn wav_round_trips_through_hound() {
        let path = std::env::temp_dir().join(format!("chiptone-buffer-{}.wav", std::process::id()));
        let buf = SampleBuffer::new(vec![0.0, 0.5, -1.0, 2.0], 22_050).unwrap();
        buf.write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().channels, 1);
        let got: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(got, vec![0, 16_384, -32_767, 32_767]);
        let _ = std::fs::remove_file(&path);
    }
}
