//! Client side of the bookmark service.
//!
//! # Architecture
//!
//! - [`ApiClient`] - Bookmark creation, retrieval and asset attachment
//! - [`Uploader`] - Streaming `multipart/form-data` asset upload
//! - [`Poller`] - Waits for tag generation to reach a terminal state
//!
//! # Key Features
//!
//! - **Constant memory uploads**: files are framed through a bounded pipe,
//!   never buffered whole
//! - **Ordered completion**: an upload returns only after its producer task
//!   has reported, and producer failures win over the HTTP outcome
//! - **Cancellable**: uploads and polls observe a shared
//!   [`CancellationToken`](tokio_util::sync::CancellationToken)

mod asset;
mod bookmark;
mod client;
mod error;
mod multipart;
mod poll;
mod upload;

pub use asset::{AssetAttachment, AssetType, RemoteAsset};
pub use bookmark::{Bookmark, NewBookmark, Tag, TaggingStatus};
pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, BoxError, PollError, Result, UploadError};
pub use multipart::Multipart;
pub use poll::{BookmarkSource, PollOptions, Poller};
pub use upload::Uploader;

/// Whether `raw` is an absolute http(s) URL with a host.
pub fn is_web_url(raw: &str) -> bool {
    bookmark::is_web_url(raw)
}
