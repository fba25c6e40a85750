use std::future::Future;
use std::sync::Arc;

use hoard_fetch::{HttpClient, Processor, TemporaryArtifact};
use hoard_remote::{
    ApiClient, AssetAttachment, Bookmark, NewBookmark, PollOptions, Poller, RemoteAsset, Uploader,
};
use hoard_sniff::{AllowList, Validator};
use tokio_util::sync::CancellationToken;

use crate::error::{IngestError, Result};

/// One message to turn into a bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub bookmark: NewBookmark,
    /// Image to download and attach as the bookmark's banner.
    pub image_url: Option<String>,
    /// Text the reply is built from; tags are appended to it.
    pub text: String,
}

impl IngestRequest {
    /// Build a request from a chat-style message and optional image.
    ///
    /// With an image the message acts as its caption and always becomes a
    /// text bookmark. `None` for a blank message, captionless images
    /// included.
    pub fn from_message(text: &str, image_url: Option<&str>) -> Option<Self> {
        let bookmark = match image_url {
            _ if text.trim().is_empty() => return None,
            Some(_) => NewBookmark::Text {
                text: text.to_owned(),
            },
            None => NewBookmark::from_message(text)?,
        };

        Some(Self {
            bookmark,
            image_url: image_url.map(str::to_owned),
            text: text.to_owned(),
        })
    }
}

/// Result of a completed ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Snapshot with tagging in its terminal `success` state.
    pub bookmark: Bookmark,
    pub asset: Option<RemoteAsset>,
    /// The request text followed by a blank line and the hashtags.
    pub reply: String,
}

impl IngestOutcome {
    fn new(request: &IngestRequest, bookmark: Bookmark, asset: Option<RemoteAsset>) -> Self {
        let hashtags = bookmark.hashtags();
        let reply = match (request.text.is_empty(), hashtags.is_empty()) {
            (_, true) => request.text.clone(),
            (true, false) => hashtags,
            (false, false) => format!("{}\n\n{hashtags}", request.text),
        };

        Self {
            bookmark,
            asset,
            reply,
        }
    }
}

/// Receives the outcome of every successful ingestion, e.g. to reply to the
/// originating chat message.
pub trait Notifier: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn notify(&self, outcome: &IngestOutcome) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    type Error = std::convert::Infallible;

    async fn notify(&self, outcome: &IngestOutcome) -> Result<(), Self::Error> {
        tracing::info!(
            bookmark_id = %outcome.bookmark.id,
            tags = %outcome.bookmark.hashtags(),
            "bookmark ready"
        );
        Ok(())
    }
}

/// Knobs of an [`Ingestor`] beyond its collaborators.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Content accepted for image downloads. `None` accepts anything.
    pub validator: Option<AllowList>,
    pub poll: PollOptions,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            validator: Some(AllowList::images()),
            poll: PollOptions::default(),
        }
    }
}

/// Runs the download, bookmark, upload, tagging and notify sequence.
///
/// Cloning is cheap and clones share collaborators; independent ingestions
/// may run concurrently.
pub struct Ingestor<C: HttpClient, N> {
    inner: Arc<Inner<C, N>>,
}

struct Inner<C: HttpClient, N> {
    processor: Processor<C>,
    validator: Option<AllowList>,
    api: ApiClient,
    uploader: Uploader,
    poller: Poller<ApiClient>,
    notifier: N,
}

impl<C: HttpClient, N> Clone for Ingestor<C, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: HttpClient, N: Notifier> Ingestor<C, N> {
    pub fn new(processor: Processor<C>, api: ApiClient, notifier: N, options: IngestOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                processor,
                validator: options.validator,
                uploader: api.uploader(),
                poller: Poller::new(api.clone(), options.poll),
                api,
                notifier,
            }),
        }
    }

    pub fn notifier(&self) -> &N {
        &self.inner.notifier
    }

    pub async fn ingest(&self, request: &IngestRequest) -> Result<IngestOutcome> {
        self.ingest_cancellable(request, &CancellationToken::new()).await
    }

    /// Like [`ingest`](Self::ingest), stopping at the next suspension point
    /// once `cancel` fires.
    ///
    /// The image is downloaded and validated before anything is created
    /// remotely. The downloaded file is removed on every path.
    #[tracing::instrument(
        name = "ingest",
        skip_all,
        fields(kind = request.bookmark.kind(), image = request.image_url.is_some())
    )]
    pub async fn ingest_cancellable(
        &self,
        request: &IngestRequest,
        cancel: &CancellationToken,
    ) -> Result<IngestOutcome> {
        let inner = &*self.inner;

        let artifact = match &request.image_url {
            Some(url) => {
                let validator = inner.validator.as_ref().map(|v| v as &dyn Validator);
                Some(inner.processor.process_cancellable(url, validator, cancel).await?)
            }
            None => None,
        };

        let bookmark = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(IngestError::Cancelled),
            res = inner.api.create_bookmark(&request.bookmark) => {
                res.map_err(IngestError::CreateBookmark)?
            }
        };

        let asset = match &artifact {
            Some(artifact) => Some(self.attach(&bookmark, artifact, cancel).await?),
            None => None,
        };

        tracing::debug!(bookmark_id = %bookmark.id, "waiting for tags");
        let tagged = inner.poller.wait(&bookmark.id, cancel).await?;

        let outcome = IngestOutcome::new(request, tagged, asset);
        inner
            .notifier
            .notify(&outcome)
            .await
            .map_err(|e| IngestError::Notify(Box::new(e)))?;

        if let Some(mut artifact) = artifact {
            if let Err(e) = artifact.release() {
                tracing::warn!(path = %artifact.path().display(), error = %e, "failed to release artifact");
            }
        }

        tracing::info!(bookmark_id = %outcome.bookmark.id, "ingested");
        Ok(outcome)
    }

    async fn attach(
        &self,
        bookmark: &Bookmark,
        artifact: &TemporaryArtifact,
        cancel: &CancellationToken,
    ) -> Result<RemoteAsset> {
        let inner = &*self.inner;
        let mime = artifact.content_type().essence();
        let asset = inner
            .uploader
            .create_asset(artifact.path(), &mime, cancel)
            .await?;

        let attachment = AssetAttachment::banner(&asset.id);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(IngestError::Cancelled),
            res = inner.api.attach_asset(&bookmark.id, &attachment) => {
                res.map_err(|source| IngestError::Attach {
                    bookmark_id: bookmark.id.clone(),
                    source,
                })?
            }
        }

        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoard_remote::{Tag, TaggingStatus};

    fn bookmark(tags: &[&str]) -> Bookmark {
        Bookmark {
            id: "b1".into(),
            tagging_status: TaggingStatus::Success,
            tags: tags.iter().map(|n| Tag { name: (*n).into() }).collect(),
        }
    }

    #[test]
    fn link_message_becomes_link_bookmark() {
        let request = IngestRequest::from_message("https://example.com", None).unwrap();
        assert_eq!(request.bookmark.kind(), "link");
        assert!(request.image_url.is_none());
    }

    #[test]
    fn captioned_image_becomes_text_bookmark() {
        let request =
            IngestRequest::from_message("https://example.com", Some("https://cdn/x.png")).unwrap();
        assert_eq!(request.bookmark.kind(), "text");
        assert_eq!(request.image_url.as_deref(), Some("https://cdn/x.png"));
    }

    #[test]
    fn blank_messages_are_ignored() {
        assert!(IngestRequest::from_message("  ", None).is_none());
        assert!(IngestRequest::from_message("", Some("https://cdn/x.png")).is_none());
    }

    #[test]
    fn reply_appends_hashtags() {
        let request = IngestRequest::from_message("read later", None).unwrap();
        let outcome = IngestOutcome::new(&request, bookmark(&["rust", "async io"]), None);
        assert_eq!(outcome.reply, "read later\n\n#rust #asyncio");
    }

    #[test]
    fn reply_without_tags_is_unchanged() {
        let request = IngestRequest::from_message("read later", None).unwrap();
        let outcome = IngestOutcome::new(&request, bookmark(&[]), None);
        assert_eq!(outcome.reply, "read later");
    }
}
