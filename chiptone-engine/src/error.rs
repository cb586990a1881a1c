//! Error types for buffer building, bank loading and audio output.

use thiserror::Error;

/// Result type for synthesizer operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors that can occur while defining, building or playing sounds.
///
/// Everything except [`SynthError::Output`] and the I/O family is a
/// configuration error caught before any audio is produced.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Sample rate of zero.
    #[error("invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate.
        rate: u32,
    },

    /// Non-positive or non-finite duration.
    #[error("invalid duration: {duration} seconds")]
    InvalidDuration {
        /// The invalid duration.
        duration: f64,
    },

    /// Non-positive or non-finite frequency.
    #[error("invalid frequency: {freq} Hz")]
    InvalidFrequency {
        /// The invalid frequency.
        freq: f64,
    },

    /// Any other out-of-range parameter.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Pitch name missing from the note table.
    #[error("unknown note name: {0:?}")]
    UnknownNote(String),

    /// Two sound definitions share a name.
    #[error("duplicate sound name: {0:?}")]
    DuplicateSound(String),

    /// The audio device could not be opened or started.
    #[error("audio output error: {0}")]
    Output(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV encoding error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Bank file parse error.
    #[error("bank file error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SynthError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an output error.
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }
}

/// Rejects a zero sample rate.
pub(crate) fn check_sample_rate(rate: u32) -> SynthResult<()> {
    if rate == 0 {
        return Err(SynthError::InvalidSampleRate { rate });
    }
    Ok(())
}

/// Rejects non-finite or non-positive durations.
pub(crate) fn check_duration(duration: f64) -> SynthResult<()> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(SynthError::InvalidDuration { duration });
    }
    Ok(())
}

/// Rejects non-finite or non-positive frequencies.
pub(crate) fn check_frequency(freq: f64) -> SynthResult<()> {
    if !freq.is_finite() || freq <= 0.0 {
        return Err(SynthError::InvalidFrequency { freq });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_helper() {
        let err = SynthError::invalid_param("sustain", "must be between 0 and 1");
        assert!(err.to_string().contains("sustain"));
        assert!(err.to_string().contains("between 0 and 1"));
    }

    #[test]
    fn test_checks() {
        assert!(matches!(check_sample_rate(0), Err(SynthError::InvalidSampleRate { rate: 0 })));
        assert!(check_sample_rate(44_100).is_ok());
        assert!(check_duration(f64::INFINITY).is_err());
        assert!(check_duration(-1.0).is_err());
        assert!(check_frequency(0.0).is_err());
        assert!(check_frequency(440.0).is_ok());
    }
}
