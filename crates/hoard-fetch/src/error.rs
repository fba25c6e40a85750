//! Error types for hoard-fetch.

use std::io;
use std::time::Duration;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("download failed: HTTP status {status}")]
    Status { status: u16 },

    #[error("download failed: {0}")]
    Network(#[source] BoxError),

    #[error("download failed: timed out after {0:?}")]
    Timeout(Duration),

    #[error("download cancelled")]
    Cancelled,

    #[error("validation failed: exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("validation failed: {0}")]
    Rejected(#[source] hoard_sniff::Error),

    #[error("processing failed: {0}")]
    Io(#[from] io::Error),
}

/// Coarse category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure, non-success status or timeout.
    Download,
    /// Oversize payload or content refused by the validator.
    Validation,
    /// Local I/O on the temporary file.
    Processing,
    /// Caller aborted the download.
    Cancelled,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Status { .. } | Error::Network(_) | Error::Timeout(_) => ErrorKind::Download,
            Error::TooLarge { .. } | Error::Rejected(_) => ErrorKind::Validation,
            Error::Io(_) => ErrorKind::Processing,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_download(&self) -> bool {
        self.kind() == ErrorKind::Download
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::Status { status: 404 }.kind(), ErrorKind::Download);
        assert_eq!(Error::Timeout(Duration::from_secs(1)).kind(), ErrorKind::Download);
        assert_eq!(Error::TooLarge { limit: 100 }.kind(), ErrorKind::Validation);
        assert_eq!(Error::Io(io::ErrorKind::Other.into()).kind(), ErrorKind::Processing);
        assert!(Error::Cancelled.is_cancelled());
    }

    #[test]
    fn too_large_message_names_the_limit() {
        assert_eq!(
            Error::TooLarge { limit: 100 }.to_string(),
            "validation failed: exceeds 100 bytes"
        );
    }
}
