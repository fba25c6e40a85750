//! Bounded HTTP downloads into self-cleaning temporary artifacts.
//!
//! # Architecture
//!
//! - [`ProcessorOptions`] - Immutable limits (directory, byte ceiling, timeout)
//! - [`Limited`] - Length-limited body stream
//! - [`Processor`] - Download, bound, validate
//! - [`TemporaryArtifact`] - Owned result; removes its file exactly once
//!
//! # Key Features
//!
//! - **Bounded**: never writes more than `max_bytes + 1` bytes, whatever the
//!   server claims in `Content-Length`
//! - **No dangling files**: every error path removes the temporary file
//!   before returning
//! - **Explicit client**: the [`HttpClient`] is constructed by the caller and
//!   may be shared between concurrent downloads

mod artifact;
mod client;
mod error;
mod limit;
mod options;
mod processor;

pub use artifact::TemporaryArtifact;
pub use client::{BoxStream, HttpClient, Response};
pub use error::{Error, ErrorKind, Result};
pub use limit::Limited;
pub use options::ProcessorOptions;
pub use processor::Processor;

#[cfg(feature = "reqwest")]
pub use client::ReqwestClient;
