//! Client-side error taxonomy for the API boundary.
//!
//! Every operation against the backend resolves to `Result<T, ApiError>`;
//! nothing panics past this boundary and callers branch on the variant.
//! Absent extracted fields are not errors — they are `None` inside a
//! `TrackedValue` and render as "Not extracted".

use thiserror::Error;

/// Errors that can occur when talking to the tender platform backend.
///
/// The variants are plain data (cloneable) so failed results can live
/// in the resource cache next to successful ones.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response was received at all
    #[error("transport error: {0}")]
    Transport(String),

    /// The request timed out before a response arrived
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build an error from a non-success HTTP response.
    ///
    /// The message is read from a `detail` or `message` body field when
    /// present; otherwise a generic transport-style message is
    /// synthesized from the status code.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("message"))
                    .and_then(|m| m.as_str().map(str::to_string))
            })
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Self::Http { status, message }
    }

    /// Returns true if this error is transient and worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) => false,
        }
    }

    /// Returns true if retrying cannot help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

/// Result alias used across the API boundary and the resource cache.
pub type ApiResult<T> = Result<T, ApiError>;
