//! Error types for the chat voice pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the chat voice pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Stream has no active chat, or its metadata is missing or malformed
    ///
    /// This is the only error that stops the polling loop.
    #[error("chat feed unavailable: {0}")]
    FeedUnavailable(String),

    /// Fetching chat messages failed (transport or malformed response)
    #[error("chat fetch failed: {0}")]
    FetchFailed(String),

    /// Reply backend failed (timeout, quota, malformed response)
    #[error("reply generation failed: {0}")]
    GenerationFailed(String),

    /// Synthesis backend, artifact I/O or playback failed
    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Audio device or decoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether the polling loop must stop on this error
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::FeedUnavailable(_))
    }
}

/// Describe an HTTP failure without its request URL
///
/// Request URLs carry API keys in their query string and these messages end
/// up in the logs.
pub(crate) fn http_failure(context: &str, e: reqwest::Error) -> String {
    format!("{context}: {}", e.without_url())
}
