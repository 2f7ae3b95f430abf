//! Error types for audio operations.

use thiserror::Error;

/// Result type alias for audio operations.
pub type Result<T> = std::result::Result<T, AudioError>;

/// Error type for decoding, encoding and transforming audio.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The container or codec could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The input uses a layout this crate does not handle.
    #[error("unsupported audio: {0}")]
    Unsupported(String),

    /// The input decoded to zero frames.
    #[error("audio contains no samples")]
    Empty,

    /// A duration too long to hold in memory.
    #[error("duration {0:?} is too long")]
    TooLong(std::time::Duration),

    /// Sample-rate conversion failed.
    #[error("resample error: {0}")]
    Resample(String),

    /// WAV encode/decode error.
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(e: symphonia::core::errors::Error) -> Self {
        AudioError::Decode(e.to_string())
    }
}

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(e: rubato::ResampleError) -> Self {
        AudioError::Resample(e.to_string())
    }
}
