//! Classifier error types.

use stash_core::errors::CoreError;
use thiserror::Error;

/// Everything that can go wrong asking the classifier.
///
/// Network failures, service errors, empty bodies and malformed bodies are
/// all a failed classification; callers route them to review alike.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// HTTP transport error (connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The service returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The service answered with no content.
    #[error("empty response from classifier")]
    EmptyResponse,

    /// The body could not be parsed as the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The body parsed but breaks the contract (blank title, unknown task id, ...).
    #[error("invalid response: {0}")]
    Invalid(String),

    /// The selected backend lacks a required setting.
    #[error("classifier not configured: {0}")]
    NotConfigured(String),
}

impl From<CoreError> for ClassifyError {
    fn from(err: CoreError) -> Self {
        Self::Invalid(err.to_string())
    }
}
