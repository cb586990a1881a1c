//! Loopable background music: a lead line and a bass line mixed additively
//! into one buffer, then peak-normalized to 70 % of full scale.
//!
//! Each note renders over `[floor(time*sr), floor((time+duration)*sr))`,
//! clipped to the loop. Time inside a note is note-local, so every note
//! starts its waveform at phase zero.

use chiptone_core::dsp::{normalize_peak, sample_count, sample_index};
use chiptone_core::envelopes::NoteEnvelope;
use chiptone_core::notes::note_frequency;
use chiptone_core::wave::{sawtooth, square};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::buffer::SampleBuffer;
use crate::error::{check_duration, check_sample_rate, SynthError, SynthResult};

/// Peak level of the finished loop, as a fraction of full scale.
pub const MUSIC_PEAK: f32 = 0.7;

/// One sequenced note: a pitch name held for `duration` seconds from `time`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub note: String,
    pub duration: f64,
    pub time: f64,
}

impl NoteEvent {
    pub fn new(note: impl Into<String>, duration: f64, time: f64) -> Self {
        Self { note: note.into(), duration, time }
    }
}

/// Fixed tone of a music line.
#[derive(Copy, Clone, Debug)]
pub struct Voice {
    pub envelope: NoteEnvelope,
    pub waveform: fn(f64) -> f64,
    pub weight: f64,
}

impl Voice {
    /// Square lead: 10 ms attack, 50 ms release, mix weight 0.15.
    pub const LEAD: Voice = Voice { envelope: NoteEnvelope::new(0.01, 0.05), waveform: square, weight: 0.15 };

    /// Sawtooth bass: 20 ms attack, 100 ms release, mix weight 0.2.
    pub const BASS: Voice = Voice { envelope: NoteEnvelope::new(0.02, 0.1), waveform: sawtooth, weight: 0.2 };
}

/// Everything needed to render a music loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicArrangement {
    pub melody: Vec<NoteEvent>,
    #[serde(default)]
    pub bass: Vec<NoteEvent>,
    pub loop_duration: f64,
}

impl MusicArrangement {
    /// The shop's theme: a two-bar arpeggio over C then A minor, 4 s loop.
    pub fn shop_theme() -> Self {
        let lead = [
            "C4", "E4", "G4", "B4", "C5", "B4", "G4", "E4",
            "A3", "C4", "E4", "G4", "A4", "G4", "E4", "C4",
        ];
        let melody = lead
            .iter()
            .enumerate()
            .map(|(i, n)| NoteEvent::new(*n, 0.2, i as f64 * 0.25))
            .collect();
        let bass = vec![
            NoteEvent::new("C3", 0.5, 0.0),
            NoteEvent::new("G3", 0.5, 0.5),
            NoteEvent::new("A3", 0.5, 2.0),
            NoteEvent::new("E3", 0.5, 2.5),
        ];
        Self { melody, bass, loop_duration: 4.0 }
    }

    /// Render with the standard lead and bass voices.
    pub fn build(&self, sample_rate: u32) -> SynthResult<SampleBuffer> {
        build_music(&self.melody, &self.bass, self.loop_duration, sample_rate)
    }
}

/// Mix `melody` (lead voice) and `bass` (bass voice) into a loop of
/// `loop_duration` seconds and normalize its peak to [`MUSIC_PEAK`].
///
/// Unknown pitch names and negative note times or durations are rejected
/// before anything is rendered.
pub fn build_music(
    melody: &[NoteEvent],
    bass: &[NoteEvent],
    loop_duration: f64,
    sample_rate: u32,
) -> SynthResult<SampleBuffer> {
    check_sample_rate(sample_rate)?;
    check_duration(loop_duration)?;

    let lead_notes = resolve(melody)?;
    let bass_notes = resolve(bass)?;

    let mut data = vec![0.0_f32; sample_count(loop_duration, sample_rate)];
    for (ev, freq) in &lead_notes {
        render_note(&mut data, sample_rate, ev, *freq, &Voice::LEAD);
    }
    for (ev, freq) in &bass_notes {
        render_note(&mut data, sample_rate, ev, *freq, &Voice::BASS);
    }

    let peak = normalize_peak(&mut data, MUSIC_PEAK);
    info!(
        notes = lead_notes.len() + bass_notes.len(),
        samples = data.len(),
        peak_before = peak,
        "built music loop"
    );
    SampleBuffer::new(data, sample_rate)
}

fn resolve(events: &[NoteEvent]) -> SynthResult<Vec<(&NoteEvent, f64)>> {
    events
        .iter()
        .map(|ev| {
            if !ev.time.is_finite() || ev.time < 0.0 {
                return Err(SynthError::invalid_param("time", format!("note {} starts at {}", ev.note, ev.time)));
            }
            if !ev.duration.is_finite() || ev.duration < 0.0 {
                return Err(SynthError::InvalidDuration { duration: ev.duration });
            }
            let freq = note_frequency(&ev.note).ok_or_else(|| SynthError::UnknownNote(ev.note.clone()))?;
            Ok((ev, freq))
        })
        .collect()
}

/// Accumulate one note into `data`.
fn render_note(data: &mut [f32], sample_rate: u32, ev: &NoteEvent, freq: f64, voice: &Voice) {
    let sr = f64::from(sample_rate);
    let start = sample_index(ev.time, sample_rate);
    let end = sample_index(ev.time + ev.duration, sample_rate).min(data.len());

    for i in start..end {
        let t = (i - start) as f64 / sr;
        let env = voice.envelope.amplitude(t, ev.duration);
        let wave = (voice.waveform)(t * freq);
        #[allow(clippy::cast_possible_truncation)]
        let v = (wave * env * voice.weight) as f32;
        data[i] += v;
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chiptone_core::dsp::peak_abs;

    #[test]
    fn theme_normalizes_to_seventy_percent() {
        let buf = MusicArrangement::shop_theme().build(22_050).unwrap();
        assert_eq!(buf.len(), 88_200);
        assert!((buf.peak() - MUSIC_PEAK).abs() < 1e-6, "peak={}", buf.peak());
    }

    #[test]
    fn gaps_between_notes_are_silent() {
        let sr = 8_000;
        let buf = MusicArrangement::shop_theme().build(sr).unwrap();
        // 1.2 s .. 1.25 s: lead rests, bass has ended at 1.0 s
        let rest = &buf.samples()[9_700..9_990];
        assert!(rest.iter().all(|&s| s == 0.0));
        // 3.96 s: only silence until the loop wraps
        assert_eq!(buf.samples()[31_700], 0.0);
    }

    #[test]
    fn overlapping_notes_accumulate() {
        let sr = 8_000;
        let one = build_music(&[NoteEvent::new("A4", 0.5, 0.0)], &[], 1.0, sr).unwrap();
        let two = build_music(&[NoteEvent::new("A4", 0.5, 0.0), NoteEvent::new("A4", 0.5, 0.0)], &[], 1.0, sr).unwrap();
        // identical notes sum, then normalization scales them back to the same shape
        assert_eq!(one.len(), two.len());
        for (a, b) in one.samples().iter().zip(two.samples()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn notes_are_clipped_to_the_loop() {
        let sr = 1_000;
        let buf = build_music(&[NoteEvent::new("C4", 2.0, 0.5)], &[], 1.0, sr).unwrap();
        assert_eq!(buf.len(), 1_000);
        assert!(buf.samples()[..500].iter().all(|&s| s == 0.0));
        assert!(peak_abs(&buf.samples()[500..]) > 0.0);

        let beyond = build_music(&[NoteEvent::new("C4", 0.2, 5.0)], &[], 1.0, sr).unwrap();
        assert!(beyond.samples().iter().all(|&s| s == 0.0), "silent loop stays silent");
    }

    #[test]
    fn bass_uses_note_local_sawtooth() {
        let sr = 8_000;
        let buf = build_music(&[], &[NoteEvent::new("A3", 0.5, 1.0)], 2.0, sr).unwrap();
        let start = 8_000;
        // first sample of the note: attack gain 0
        assert_eq!(buf.samples()[start], 0.0);
        // mid-note (flat gain) the shape is a 220 Hz ramp restarted at the onset
        let saw_at = |k: usize| sawtooth(k as f64 / 8_000.0 * 220.0);
        let (a, b) = (1_010, 1_500);
        let want = saw_at(a) / saw_at(b);
        let got = f64::from(buf.samples()[start + a]) / f64::from(buf.samples()[start + b]);
        assert!((got - want).abs() < 1e-4, "got={got} want={want}");
    }

    #[test]
    fn configuration_errors_surface() {
        assert!(matches!(
            build_music(&[NoteEvent::new("H2", 0.2, 0.0)], &[], 1.0, 8_000),
            Err(SynthError::UnknownNote(n)) if n == "H2"
        ));
        assert!(build_music(&[], &[], 1.0, 0).is_err());
        assert!(build_music(&[], &[], 0.0, 8_000).is_err());
        assert!(build_music(&[NoteEvent::new("C4", -0.2, 0.0)], &[], 1.0, 8_000).is_err());
        assert!(build_music(&[NoteEvent::new("C4", 0.2, -1.0)], &[], 1.0, 8_000).is_err());
    }

    #[test]
    fn arrangement_parses_from_json() {
        let json = r#"{
            "melody": [{ "note": "E4", "duration": 0.2, "time": 0.0 }],
            "loopDuration": 1.0
        }"#;
        let arr: MusicArrangement = serde_json::from_str(json).unwrap();
        assert!(arr.bass.is_empty());
        let buf = arr.build(8_000).unwrap();
        assert!((buf.peak() - MUSIC_PEAK).abs() < 1e-6);
    }
}
