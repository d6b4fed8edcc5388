//! Errors raised while talking to the student API.

use thiserror::Error;

/// Why a fetch failed. The synchronizer treats every variant the same way
/// (keep the previous snapshot, log, move on); the distinction only shows
/// up in diagnostics.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout and the like.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with a non-2xx status.
    #[error("API returned HTTP {status}")]
    Status { status: u16 },

    /// The body was not the JSON shape we expected.
    #[error("malformed response body: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
