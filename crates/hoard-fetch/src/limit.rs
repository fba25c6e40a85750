use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures_util::Stream;

/// Body stream that ends after yielding `limit` bytes.
///
/// The last chunk is truncated to fit. Once the budget is spent the inner
/// stream is not polled again, so the rest of an oversized body is never
/// read off the wire.
pub struct Limited<S> {
    inner: S,
    remaining: u64,
}

impl<S> Limited<S> {
    pub fn new(inner: S, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl<S, E> Stream for Limited<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.remaining == 0 {
            return Poll::Ready(None);
        }

        match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
            Some(Ok(mut chunk)) => {
                if chunk.len() as u64 > self.remaining {
                    chunk.truncate(self.remaining as usize);
                }
                self.remaining -= chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            other => Poll::Ready(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, stream};
    use std::convert::Infallible;

    fn chunks(sizes: &[usize]) -> impl Stream<Item = Result<Bytes, Infallible>> + Unpin {
        stream::iter(
            sizes
                .iter()
                .map(|&n| Ok(Bytes::from(vec![0u8; n])))
                .collect::<Vec<_>>(),
        )
    }

    async fn total<S: Stream<Item = Result<Bytes, Infallible>> + Unpin>(s: S) -> usize {
        s.map(|c| c.unwrap().len()).fold(0, |a, n| async move { a + n }).await
    }

    #[tokio::test]
    async fn passes_through_when_under_limit() {
        assert_eq!(total(Limited::new(chunks(&[10, 20, 30]), 100)).await, 60);
    }

    #[tokio::test]
    async fn truncates_at_limit() {
        assert_eq!(total(Limited::new(chunks(&[60, 60]), 101)).await, 101);
    }

    #[tokio::test]
    async fn stops_polling_inner_once_spent() {
        let mut limited = Limited::new(chunks(&[5, 5, 5]), 5);
        assert_eq!(limited.next().await.unwrap().unwrap().len(), 5);
        assert_eq!(limited.remaining(), 0);
        assert!(limited.next().await.is_none());
    }

    #[tokio::test]
    async fn zero_limit_yields_nothing() {
        assert_eq!(total(Limited::new(chunks(&[1]), 0)).await, 0);
    }
}
