use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::bookmark::{Bookmark, TaggingStatus};
use crate::client::ApiClient;
use crate::error::{ApiError, PollError};

/// Anything that can produce a fresh bookmark snapshot by id.
pub trait BookmarkSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn bookmark(&self, id: &str) -> impl Future<Output = Result<Bookmark, Self::Error>> + Send;
}

impl BookmarkSource for ApiClient {
    type Error = ApiError;

    async fn bookmark(&self, id: &str) -> Result<Bookmark, ApiError> {
        ApiClient::bookmark(self, id).await
    }
}

/// How often, and for how long, to wait for tagging.
///
/// With neither `max_attempts` nor `deadline` set the poller waits for as
/// long as the bookmark stays pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Pause between consecutive fetches.
    ///
    /// Default: 5s
    pub interval: Duration,

    /// Give up after this many fetches.
    pub max_attempts: Option<u32>,

    /// Give up once this much time has passed since the first fetch.
    pub deadline: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: None,
            deadline: None,
        }
    }
}

impl PollOptions {
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Waits for a bookmark's tagging to reach a terminal state.
#[derive(Debug, Clone)]
pub struct Poller<S> {
    source: S,
    options: PollOptions,
}

impl<S: BookmarkSource> Poller<S> {
    pub fn new(source: S, options: PollOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Fetch `id` until its tagging succeeds.
    ///
    /// A fetch error ends the wait immediately; it is not retried.
    pub async fn wait(&self, id: &str, cancel: &CancellationToken) -> Result<Bookmark, PollError> {
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let snapshot = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                res = self.source.bookmark(id) => res.map_err(|e| PollError::Fetch(Box::new(e)))?,
            };

            match snapshot.tagging_status {
                TaggingStatus::Success => {
                    tracing::info!(bookmark_id = id, attempt, tags = snapshot.tags.len(), "tagging complete");
                    return Ok(snapshot);
                }
                TaggingStatus::Failure => {
                    tracing::warn!(bookmark_id = id, attempt, "tagging failed");
                    return Err(PollError::TaggingFailed(Box::new(snapshot)));
                }
                TaggingStatus::Pending => {}
            }

            let elapsed = started.elapsed();
            if self.options.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(PollError::Exhausted { attempts: attempt, elapsed });
            }

            let mut pause = self.options.interval;
            if let Some(deadline) = self.options.deadline {
                let remaining = deadline.saturating_sub(elapsed);
                if remaining.is_zero() {
                    return Err(PollError::Exhausted { attempts: attempt, elapsed });
                }
                pause = pause.min(remaining);
            }

            tracing::debug!(
                bookmark_id = id,
                tagging_status = %snapshot.tagging_status,
                attempt,
                wait = ?pause,
                "tagging pending"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("backend unavailable")]
    struct Unavailable;

    /// Replays a script of statuses, repeating the last one forever.
    struct Scripted {
        script: Mutex<Vec<Result<TaggingStatus, ()>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(script: Vec<Result<TaggingStatus, ()>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl BookmarkSource for Scripted {
        type Error = Unavailable;

        async fn bookmark(&self, id: &str) -> Result<Bookmark, Unavailable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 { script.remove(0) } else { script[0] }
            };
            next.map(|tagging_status| Bookmark {
                id: id.to_owned(),
                tagging_status,
                tags: Vec::new(),
            })
            .map_err(|()| Unavailable)
        }
    }

    fn poller(script: Vec<Result<TaggingStatus, ()>>, options: PollOptions) -> Poller<Scripted> {
        Poller::new(Scripted::new(script), options)
    }

    use TaggingStatus::{Failure, Pending, Success};

    #[tokio::test(start_paused = true)]
    async fn waits_through_pending_until_success() {
        let p = poller(
            vec![Ok(Pending), Ok(Pending), Ok(Success)],
            PollOptions::default().interval(Duration::from_secs(5)),
        );
        let start = Instant::now();
        let bookmark = p.wait("b1", &CancellationToken::new()).await.unwrap();

        assert_eq!(bookmark.tagging_status, Success);
        assert_eq!(p.source().calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_carries_snapshot() {
        let p = poller(vec![Ok(Pending), Ok(Failure)], PollOptions::default());
        let err = p.wait("b1", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PollError::TaggingFailed(ref b) if b.id == "b1"));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_is_not_retried() {
        let p = poller(vec![Ok(Pending), Err(()), Ok(Success)], PollOptions::default());
        let err = p.wait("b1", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PollError::Fetch(_)));
        assert_eq!(p.source().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn max_attempts_bounds_the_wait() {
        let p = poller(vec![Ok(Pending)], PollOptions::default().max_attempts(3));
        let err = p.wait("b1", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PollError::Exhausted { attempts: 3, .. }));
        assert_eq!(p.source().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_wait() {
        let p = poller(
            vec![Ok(Pending)],
            PollOptions::default()
                .interval(Duration::from_secs(4))
                .deadline(Duration::from_secs(10)),
        );
        let start = Instant::now();
        let err = p.wait("b1", &CancellationToken::new()).await.unwrap_err();

        // Fetches at 0s, 4s, 8s and 10s.
        assert!(matches!(err, PollError::Exhausted { attempts: 4, .. }));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let p = poller(vec![Ok(Pending)], PollOptions::default().interval(Duration::from_secs(60)));
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                cancel.cancel();
            }
        };
        let (res, ()) = tokio::join!(p.wait("b1", &cancel), canceller);

        assert!(res.unwrap_err().is_cancelled());
        assert_eq!(p.source().calls(), 1);
    }

    #[tokio::test]
    async fn already_cancelled_never_fetches() {
        let p = poller(vec![Ok(Success)], PollOptions::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(p.wait("b1", &cancel).await.unwrap_err().is_cancelled());
        assert_eq!(p.source().calls(), 0);
    }
}
