//! Pull-mode generator seam.
//!
//! Anything that renders mono samples on demand implements [`Generator`]:
//! the realtime stream callback, the FFI render call and offline tests all
//! drive the same [`Mixer`](crate::mixer::Mixer) through it.

/// Anything that can generate one sample at a time.
pub trait Generator {
    /// Output sample rate the generator renders at.
    fn sample_rate(&self) -> u32;

    /// Generate the next mono sample.
    fn next(&mut self) -> f32;

    /// Fill `out` with consecutive samples.
    #[inline]
    fn render(&mut self, out: &mut [f32]) {
        for y in out.iter_mut() {
            *y = self.next();
        }
    }

    /// Fill an interleaved buffer of `channels` channels, duplicating the
    /// mono sample into every channel of a frame.
    #[inline]
    fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        for frame in out.chunks_mut(channels) {
            let s = self.next();
            for ch in frame.iter_mut() { *ch = s; }
        }
    }
}
