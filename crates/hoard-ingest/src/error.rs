//! Error types for hoard-ingest.

use std::io;
use std::path::PathBuf;

use hoard_fetch::ErrorKind as FetchKind;
use hoard_remote::{ApiError, BoxError, PollError, UploadError};
use thiserror::Error;

/// Failure of one ingestion. The first failing step ends the run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] hoard_fetch::Error),

    #[error("failed to create bookmark: {0}")]
    CreateBookmark(#[source] ApiError),

    #[error("failed to create an asset: {0}")]
    Upload(#[from] UploadError),

    #[error("failed to attach asset to bookmark {bookmark_id}: {source}")]
    Attach {
        bookmark_id: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("failed to deliver result: {0}")]
    Notify(#[source] BoxError),

    #[error("ingestion cancelled")]
    Cancelled,
}

/// The pipeline step an [`IngestError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Download,
    Validation,
    Processing,
    Upload,
    Cancelled,
    /// Tagging ended in failure or never finished within the poll bounds.
    Tagging,
    /// A status poll could not be made.
    Fetch,
    /// Bookmark creation or asset attachment.
    Api,
    Notify,
}

impl IngestError {
    pub fn kind(&self) -> Stage {
        match self {
            IngestError::Fetch(e) => match e.kind() {
                FetchKind::Download => Stage::Download,
                FetchKind::Validation => Stage::Validation,
                FetchKind::Processing => Stage::Processing,
                FetchKind::Cancelled => Stage::Cancelled,
            },
            IngestError::CreateBookmark(_) | IngestError::Attach { .. } => Stage::Api,
            IngestError::Upload(e) if e.is_cancelled() => Stage::Cancelled,
            IngestError::Upload(_) => Stage::Upload,
            IngestError::Poll(PollError::Cancelled) => Stage::Cancelled,
            IngestError::Poll(PollError::Fetch(_)) => Stage::Fetch,
            IngestError::Poll(_) => Stage::Tagging,
            IngestError::Notify(_) => Stage::Notify,
            IngestError::Cancelled => Stage::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == Stage::Cancelled
    }
}

/// Failure to load or validate configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fetch_kinds_map_to_stages() {
        let cases = [
            (hoard_fetch::Error::Status { status: 404 }, Stage::Download),
            (hoard_fetch::Error::TooLarge { limit: 1 }, Stage::Validation),
            (hoard_fetch::Error::Io(io::ErrorKind::Other.into()), Stage::Processing),
            (hoard_fetch::Error::Cancelled, Stage::Cancelled),
        ];
        for (err, stage) in cases {
            assert_eq!(IngestError::from(err).kind(), stage);
        }
    }

    #[test]
    fn cancellation_is_recognised_in_every_step() {
        assert!(IngestError::Cancelled.is_cancelled());
        assert!(IngestError::from(UploadError::Cancelled).is_cancelled());
        assert!(IngestError::from(PollError::Cancelled).is_cancelled());
        assert!(!IngestError::from(UploadError::Empty).is_cancelled());
    }

    #[test]
    fn poll_stages() {
        let exhausted = PollError::Exhausted {
            attempts: 3,
            elapsed: Duration::from_secs(15),
        };
        assert_eq!(IngestError::from(exhausted).kind(), Stage::Tagging);
    }

    #[test]
    fn download_messages_keep_their_category() {
        let err = IngestError::from(hoard_fetch::Error::TooLarge { limit: 100 });
        assert_eq!(err.to_string(), "validation failed: exceeds 100 bytes");
    }
}
