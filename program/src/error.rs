//! Error types for rendering.

use std::time::Duration;

use apg_audio::AudioError;
use thiserror::Error;

use crate::export::ExportError;
use crate::phrase::ParseError;

/// Result type alias for rendering operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for a render.
#[derive(Error, Debug)]
pub enum Error {
    /// The script could not be parsed at all.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Synthesis of one unit failed; the whole render is aborted.
    #[error("synthesis failed for unit {index} ({text:?}): {source}")]
    Synthesis {
        index: usize,
        text: String,
        #[source]
        source: SynthError,
    },

    /// A unit's pause is negative, not finite or too long.
    #[error("unit {index} has an unusable pause of {seconds} seconds")]
    Pause { index: usize, seconds: f64 },

    /// The background track is missing, unreadable or empty.
    #[error("background track unusable: {0}")]
    MixInput(String),

    /// Audio processing error outside synthesis.
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    /// Encoding the final track failed.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// The synthesis stage did not finish in time.
    #[error("synthesis timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid render configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A synthesis task panicked or was cancelled.
    #[error("synthesis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single synthesis call.
#[derive(Error, Debug)]
pub enum SynthError {
    /// The translate TTS endpoint failed.
    #[error(transparent)]
    Gtts(#[from] apg_gtts::Error),

    /// The returned audio could not be decoded.
    #[error("undecodable speech audio: {0}")]
    Decode(#[from] AudioError),

    /// Any other provider failure.
    #[error("{message}")]
    Provider { message: String, retryable: bool },
}

impl SynthError {
    /// Creates a permanent provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        SynthError::Provider {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a provider error worth retrying.
    pub fn transient(message: impl Into<String>) -> Self {
        SynthError::Provider {
            message: message.into(),
            retryable: true,
        }
    }

    /// Returns true if the call can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SynthError::Gtts(e) => e.is_retryable(),
            SynthError::Decode(_) => false,
            SynthError::Provider { retryable, .. } => *retryable,
        }
    }
}
