//! Error types for the backend transport.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Backend unreachable or response body not decodable.
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-2xx status.
    #[error("server error: {status}")]
    Server { status: u16 },

    /// Picked image could not be read from disk.
    #[error("cannot read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
