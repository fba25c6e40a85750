//! Bookmark ingestion: download an optional image, create the bookmark,
//! attach the image, wait for tags, report back.
//!
//! # Architecture
//!
//! - [`Config`] - TOML configuration with validation
//! - [`Ingestor`] - The ingestion sequence over `hoard-fetch` and `hoard-remote`
//! - [`Notifier`] - Where finished outcomes are delivered
//!
//! Failures are reported as [`IngestError`], whose [`kind`](IngestError::kind)
//! names the step that failed.

mod config;
mod error;
mod pipeline;

pub use config::{
    Config, FileProcessorConfig, KarakeepConfig, LogFormat, LoggingConfig, Secret, TOKEN_ENV,
    URL_ENV,
};
pub use error::{ConfigError, IngestError, Result, Stage};
pub use pipeline::{IngestOptions, IngestOutcome, IngestRequest, Ingestor, LogNotifier, Notifier};
