//! Error types for hoard-remote.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::bookmark::Bookmark;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a bookmark API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid URL: scheme must be http or https, got `{0}`")]
    UnsupportedScheme(String),

    #[error("invalid URL: missing host")]
    MissingHost,

    #[error("API token is not a valid header value")]
    InvalidToken,

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("received HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Failure of a streaming asset upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read artifact: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write multipart body: {0}")]
    Pipe(#[source] io::Error),

    #[error("nothing written to the multipart field")]
    Empty,

    #[error("multipart producer exited without reporting")]
    ProducerLost,

    #[error("upload cancelled")]
    Cancelled,

    #[error("upload request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("upload rejected with HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode upload response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("upload reported error: {0}")]
    Remote(String),

    #[error("uploaded asset has size=0")]
    ZeroSize,
}

impl UploadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadError::Cancelled)
    }

    /// Write failure caused by the consumer dropping its end of the pipe.
    pub(crate) fn is_broken_pipe(&self) -> bool {
        matches!(self, UploadError::Pipe(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

/// Failure while waiting for a bookmark to reach a terminal tagging state.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to retrieve bookmark: {0}")]
    Fetch(#[source] BoxError),

    #[error("tagging failed for bookmark {}", .0.id)]
    TaggingFailed(Box<Bookmark>),

    #[error("tagging still pending after {attempts} attempts ({elapsed:?})")]
    Exhausted { attempts: u32, elapsed: Duration },

    #[error("polling cancelled")]
    Cancelled,
}

impl PollError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PollError::Cancelled)
    }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
