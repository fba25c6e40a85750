use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status line and body of a GET, before any bytes are consumed.
pub struct Response<E> {
    pub status: u16,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

impl<E> Response<E> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations hold no per-request mutable state, so one instance can
/// serve any number of concurrent downloads. Redirects, proxies and auth
/// headers are the implementation's business.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a GET and return the status with a streaming body.
    ///
    /// Non-success statuses are returned as responses, not errors.
    fn get(
        &self,
        url: &str,
    ) -> impl Future<Output = std::result::Result<Response<Self::Error>, Self::Error>> + Send;

    /// Whether `error` is the client's own timeout firing.
    fn is_timeout(_error: &Self::Error) -> bool {
        false
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use futures_util::StreamExt;

    /// Production HTTP client implementation using reqwest.
    ///
    /// Cloning is cheap; clones share the connection pool.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        pub fn inner(&self) -> &reqwest::Client {
            &self.client
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(&self, url: &str) -> std::result::Result<Response<Self::Error>, Self::Error> {
            let response = self.client.get(url).send().await?;
            let status = response.status().as_u16();
            let body = response.bytes_stream().map(|chunk| chunk.map(Bytes::from));

            Ok(Response {
                status,
                body: Box::pin(body),
            })
        }

        fn is_timeout(error: &Self::Error) -> bool {
            error.is_timeout()
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
