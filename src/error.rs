use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything a geosearch call can fail with.
///
/// Errors are handed back as-is; nothing is retried inside the client.
#[derive(Debug, Error)]
pub enum Error {
    /// The base URL and endpoint path did not form a valid URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error while reading response: {0}")]
    Io(#[from] std::io::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The service answered with a status of 300 or above.
    #[error("unexpected HTTP response {status} for url ({url})")]
    Status { status: u16, url: String },

    #[error("failed to decode feature collection: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status code carried by [`Error::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for both explicit cancellation and deadline expiry.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}
