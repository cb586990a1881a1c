//! Pitch names to frequencies (12-TET, A4 = 440 Hz), octaves 3 to 5.

/// `(name, Hz)` for every natural and sharp from C3 to B5.
pub const NOTE_TABLE: [(&str, f64); 36] = [
    ("C3", 130.81), ("C#3", 138.59), ("D3", 146.83), ("D#3", 155.56),
    ("E3", 164.81), ("F3", 174.61), ("F#3", 185.00), ("G3", 196.00),
    ("G#3", 207.65), ("A3", 220.00), ("A#3", 233.08), ("B3", 246.94),
    ("C4", 261.63), ("C#4", 277.18), ("D4", 293.66), ("D#4", 311.13),
    ("E4", 329.63), ("F4", 349.23), ("F#4", 369.99), ("G4", 392.00),
    ("G#4", 415.30), ("A4", 440.00), ("A#4", 466.16), ("B4", 493.88),
    ("C5", 523.25), ("C#5", 554.37), ("D5", 587.33), ("D#5", 622.25),
    ("E5", 659.25), ("F5", 698.46), ("F#5", 739.99), ("G5", 783.99),
    ("G#5", 830.61), ("A5", 880.00), ("A#5", 932.33), ("B5", 987.77),
];

/// Frequency of a pitch name such as `"A4"` or `"C#5"`. Names are
/// case-sensitive; `None` for anything outside the table.
#[inline]
pub fn note_frequency(name: &str) -> Option<f64> {
    NOTE_TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, hz)| hz)
}
