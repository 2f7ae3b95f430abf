//! Error types for the translate TTS client.

use thiserror::Error;

/// Result type alias for translate TTS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for translate TTS operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("gtts: unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response carried no audio payload.
    #[error("gtts: no audio stream in response")]
    NoAudio,

    /// The audio payload was not valid base64.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Nothing speakable was left after tokenizing.
    #[error("gtts: no text to speak")]
    EmptyText,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::Status { status: 429, .. })
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Status { status, .. } if *status >= 500)
    }

    /// Returns true if the request can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => self.is_rate_limit() || self.is_server_error(),
        }
    }
}
