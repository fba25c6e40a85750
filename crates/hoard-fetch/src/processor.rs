use std::io::SeekFrom;

use futures_util::StreamExt;
use hoard_sniff::{SNIFF_LEN, Validator, sniff};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::artifact::TemporaryArtifact;
use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::limit::Limited;
use crate::options::ProcessorOptions;

/// Downloads a URL into a uniquely named temporary file under a byte ceiling
/// and a wall-clock timeout.
pub struct Processor<C: HttpClient> {
    client: C,
    options: ProcessorOptions,
}

impl<C: HttpClient> Processor<C> {
    /// Create a processor, creating `options.temp_dir` if it does not exist.
    pub fn new(client: C, options: ProcessorOptions) -> Result<Self> {
        std::fs::create_dir_all(&options.temp_dir)?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Download `url`, then validate it with `validator` if given.
    ///
    /// Without a validator the content type is sniffed but nothing is
    /// rejected. On error no temporary file is left behind.
    pub async fn process(
        &self,
        url: &str,
        validator: Option<&dyn Validator>,
    ) -> Result<TemporaryArtifact> {
        self.process_cancellable(url, validator, &CancellationToken::new())
            .await
    }

    /// Like [`process`](Self::process), aborting with [`Error::Cancelled`]
    /// when `cancel` fires.
    pub async fn process_cancellable(
        &self,
        url: &str,
        validator: Option<&dyn Validator>,
        cancel: &CancellationToken,
    ) -> Result<TemporaryArtifact> {
        let staging = tempfile::Builder::new()
            .prefix("hoard-")
            .suffix(".tmp")
            .tempfile_in(&self.options.temp_dir)?;
        // `temp_path` deletes the file when dropped; it is declared before
        // `file` so the handle is closed first on every early return.
        let (std_file, temp_path) = staging.into_parts();
        let mut file = File::from_std(std_file);

        tracing::debug!(url, path = %temp_path.display(), "downloading");

        let timeout = self.options.timeout;
        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            res = tokio::time::timeout(timeout, self.download(url, &mut file)) => {
                res.map_err(|_| Error::Timeout(timeout))??
            }
        };

        if written > self.options.max_bytes {
            tracing::debug!(url, bytes = written, limit = self.options.max_bytes, "payload over limit");
            return Err(Error::TooLarge {
                limit: self.options.max_bytes,
            });
        }

        let prefix = read_prefix(&mut file).await?;
        drop(file);

        let content_type = match validator {
            Some(validator) => validator.validate(&prefix).map_err(Error::Rejected)?,
            None => sniff(&prefix),
        };

        let path = temp_path.keep().map_err(|e| Error::Io(e.error))?;
        tracing::info!(
            url,
            path = %path.display(),
            bytes = written,
            content_type = %content_type,
            "downloaded artifact"
        );

        Ok(TemporaryArtifact::new(path, written, content_type))
    }

    /// Stream the body into `file`, stopping one byte past the ceiling.
    async fn download(&self, url: &str, file: &mut File) -> Result<u64> {
        let response = self.client.get(url).await.map_err(|e| self.transport_error(e))?;
        if !response.is_success() {
            return Err(Error::Status {
                status: response.status,
            });
        }

        let mut body = Limited::new(response.body, self.options.max_bytes.saturating_add(1));
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| self.transport_error(e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }

    fn transport_error(&self, error: C::Error) -> Error {
        if C::is_timeout(&error) {
            Error::Timeout(self.options.timeout)
        } else {
            Error::Network(Box::new(error))
        }
    }
}

/// Read up to [`SNIFF_LEN`] bytes from the start, leaving the cursor at 0.
async fn read_prefix(file: &mut File) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0)).await?;
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    (&mut *file).take(SNIFF_LEN as u64).read_to_end(&mut prefix).await?;
    file.seek(SeekFrom::Start(0)).await?;
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{BoxStream, Response};
    use bytes::Bytes;
    use futures_util::stream;
    use hoard_sniff::{AllowList, MediaType};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct MockError(&'static str);

    /// Serves a fixed status and a scripted sequence of body chunks.
    struct MockClient {
        status: u16,
        chunks: Vec<std::result::Result<&'static [u8], &'static str>>,
        pending_forever: bool,
    }

    impl MockClient {
        fn ok(chunks: Vec<std::result::Result<&'static [u8], &'static str>>) -> Self {
            Self {
                status: 200,
                chunks,
                pending_forever: false,
            }
        }
    }

    impl HttpClient for MockClient {
        type Error = MockError;

        async fn get(&self, _url: &str) -> std::result::Result<Response<MockError>, MockError> {
            if self.pending_forever {
                std::future::pending::<()>().await;
            }
            let items: Vec<_> = self
                .chunks
                .iter()
                .copied()
                .map(|c| c.map(Bytes::from_static).map_err(MockError))
                .collect();
            let body: BoxStream<'static, _> = Box::pin(stream::iter(items));
            Ok(Response {
                status: self.status,
                body,
            })
        }
    }

    fn processor(client: MockClient, dir: &std::path::Path, max_bytes: u64) -> Processor<MockClient> {
        let options = ProcessorOptions::default()
            .temp_dir(dir)
            .max_bytes(max_bytes)
            .timeout(Duration::from_secs(5));
        Processor::new(client, options).unwrap()
    }

    fn is_empty(dir: &std::path::Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn creates_missing_temp_dir() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let _p = processor(MockClient::ok(vec![]), &nested, 10);
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn exactly_at_limit_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let p = processor(MockClient::ok(vec![Ok(b"12345"), Ok(b"67890")]), dir.path(), 10);
        let artifact = p.process("mock://x", None).await.unwrap();
        assert_eq!(artifact.size_bytes(), 10);
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"1234567890");
    }

    #[tokio::test]
    async fn one_byte_over_limit_is_validation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let p = processor(MockClient::ok(vec![Ok(b"12345"), Ok(b"678901")]), dir.path(), 10);
        let err = p.process("mock://x", None).await.unwrap_err();
        assert!(err.is_validation(), "{err:?}");
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn body_error_is_download_failure_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let p = processor(MockClient::ok(vec![Ok(b"abc"), Err("reset by peer")]), dir.path(), 100);
        let err = p.process("mock://x", None).await.unwrap_err();
        assert!(err.is_download(), "{err:?}");
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn non_success_status_is_download_failure() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            status: 503,
            chunks: vec![],
            pending_forever: false,
        };
        let err = processor(client, dir.path(), 100)
            .process("mock://x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Status { status: 503 }));
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn validator_rejection_is_validation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let p = processor(MockClient::ok(vec![Ok(b"plain text")]), dir.path(), 100);
        let images = AllowList::images();
        let err = p.process("mock://x", Some(&images)).await.unwrap_err();
        assert!(matches!(err, Error::Rejected(ref e) if e.is_rejection()));
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn no_validator_still_sniffs() {
        let dir = tempfile::tempdir().unwrap();
        let p = processor(MockClient::ok(vec![Ok(b"plain text")]), dir.path(), 100);
        let artifact = p.process("mock://x", None).await.unwrap();
        assert_eq!(artifact.content_type(), &MediaType::TEXT);
    }

    #[tokio::test]
    async fn cancellation_is_reported_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            status: 200,
            chunks: vec![],
            pending_forever: true,
        };
        let p = processor(client, dir.path(), 100);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = p.process_cancellable("mock://x", None, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(is_empty(dir.path()));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_server_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            status: 200,
            chunks: vec![],
            pending_forever: true,
        };
        let p = processor(client, dir.path(), 100);
        let err = p.process("mock://x", None).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_download());
    }

    #[tokio::test]
    async fn temp_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let p = processor(MockClient::ok(vec![Ok(b"x")]), dir.path(), 100);
        let (a, b) = tokio::join!(p.process("mock://a", None), p.process("mock://b", None));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.path(), b.path());
        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("hoard-") && name.ends_with(".tmp"));
    }
}
