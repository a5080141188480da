//! Fare lookup error types.

use std::sync::Arc;

/// Errors from the remote fare API and the fare cache.
///
/// Cloneable so that a single failed fetch can be reported to every caller
/// waiting on the same station pair.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FareError {
    /// Request could not be sent or the response body could not be read
    #[error("HTTP error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    /// Fare API answered with a non-success status
    #[error("fare API request failed with status {status}: {preview}")]
    RemoteStatus { status: u16, preview: String },

    /// Fare API answered with something other than JSON
    #[error("fare API returned non-JSON response (Content-Type: {content_type}). Response preview: {preview}")]
    UnexpectedContentType {
        content_type: String,
        preview: String,
    },

    /// Fare API answered with JSON that is not a fare record
    #[error("failed to parse fare API response: {message}. Response preview: {preview}")]
    Decode { message: String, preview: String },

    /// Cache file exists but does not hold a list of fare records
    #[error("fare cache is unreadable: {message}")]
    CacheRead { message: String },

    /// Cache file could not be written
    #[error("failed to write fare cache: {message}")]
    CacheWrite { message: String },
}

impl From<reqwest::Error> for FareError {
    fn from(err: reqwest::Error) -> Self {
        FareError::Transport(Arc::new(err))
    }
}
