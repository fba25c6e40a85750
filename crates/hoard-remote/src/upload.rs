use std::io;
use std::path::Path;

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::asset::{AssetReply, RemoteAsset};
use crate::error::UploadError;
use crate::multipart::Multipart;

/// Capacity of the pipe between the multipart producer and the HTTP body.
const PIPE_CAPACITY: usize = 64 * 1024;

const CHUNK_SIZE: usize = 16 * 1024;

/// Multipart field the asset endpoint reads the file from.
const FIELD_NAME: &str = "file";

/// Streams local files to the asset endpoint as `multipart/form-data`.
///
/// Memory use is bounded by the pipe capacity regardless of file size: a
/// producer task writes the framed file into one end of a duplex pipe while
/// the request body reads from the other.
#[derive(Debug, Clone)]
pub struct Uploader {
    http: reqwest::Client,
    endpoint: Url,
}

type Produced = Result<u64, UploadError>;

/// Content of the single form part: the first chunk, already read, followed
/// by whatever `rest` yields.
struct Part<R> {
    file_name: String,
    mime_type: String,
    head: Vec<u8>,
    rest: R,
}

impl Uploader {
    /// `endpoint` is the full asset URL, usually `<base>/api/v1/assets`.
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Upload the file at `path` as the single `file` part, labelled with
    /// `mime_type` and named after the path's base name.
    ///
    /// Nothing is sent when the file cannot be opened, cannot be read, or is
    /// empty. Returns only after the producer has reported. A producer
    /// failure aborts the request body and is reported in preference to the
    /// HTTP outcome.
    pub async fn create_asset(
        &self,
        path: &Path,
        mime_type: &str,
        cancel: &CancellationToken,
    ) -> Result<RemoteAsset, UploadError> {
        let part = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UploadError::Cancelled),
            res = open_part(path, mime_type) => res?,
        };

        tracing::debug!(path = %path.display(), mime_type, endpoint = %self.endpoint, "uploading asset");
        self.send(part, cancel).await
    }

    async fn send<R>(&self, part: Part<R>, cancel: &CancellationToken) -> Result<RemoteAsset, UploadError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let form = Multipart::new();
        let (reader, writer) = tokio::io::duplex(PIPE_CAPACITY);
        let (failed_tx, failed_rx) = oneshot::channel::<io::Error>();
        let (done_tx, done_rx) = oneshot::channel::<Produced>();

        let producer = tokio::spawn(produce(form.clone(), part, writer, failed_tx, done_tx));

        let request = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, form.content_type())
            .header(ACCEPT, "application/json")
            .body(reqwest::Body::wrap_stream(body_stream(reader, failed_rx)));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                producer.abort();
                let _ = producer.await;
                tracing::debug!(endpoint = %self.endpoint, "upload cancelled");
                Err(UploadError::Cancelled)
            }
            res = complete(request, done_rx) => res,
        }
    }
}

/// Open `path` and read its first chunk. An empty file is an error.
async fn open_part(path: &Path, mime_type: &str) -> Result<Part<File>, UploadError> {
    let mut file = File::open(path).await.map_err(|source| UploadError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let mut head = vec![0u8; CHUNK_SIZE];
    let n = file.read(&mut head).await.map_err(UploadError::Read)?;
    if n == 0 {
        return Err(UploadError::Empty);
    }
    head.truncate(n);

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Part {
        file_name,
        mime_type: mime_type.to_owned(),
        head,
        rest: file,
    })
}

/// Request body read from the pipe. Ends with an error item, rather than a
/// clean end of stream, when the producer reports a failure.
fn body_stream(
    reader: DuplexStream,
    failed: oneshot::Receiver<io::Error>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let tail = stream::once(failed).filter_map(|res| async move { res.ok().map(Err::<Bytes, _>) });
    ReaderStream::new(reader).chain(tail)
}

/// Run the request, then wait for the producer and reconcile the outcomes.
async fn complete(
    request: reqwest::RequestBuilder,
    done: oneshot::Receiver<Produced>,
) -> Result<RemoteAsset, UploadError> {
    let exchanged = exchange(request).await;
    let produced = done.await.unwrap_or(Err(UploadError::ProducerLost));

    match (produced, exchanged) {
        // The consumer hung up first; its error is the cause.
        (Err(producer), Err(consumer)) if producer.is_broken_pipe() => Err(consumer),
        (Err(producer), _) => Err(producer),
        (Ok(bytes), Ok(asset)) => {
            tracing::info!(
                asset_id = %asset.id,
                bytes,
                size = asset.size_bytes,
                content_type = %asset.content_type,
                "uploaded asset"
            );
            Ok(asset)
        }
        (Ok(_), Err(consumer)) => Err(consumer),
    }
}

async fn exchange(request: reqwest::RequestBuilder) -> Result<RemoteAsset, UploadError> {
    let response = request.send().await.map_err(UploadError::Network)?;
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(UploadError::Network)?;

    if !matches!(status, 200 | 201) {
        return Err(UploadError::Status {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    serde_json::from_slice::<AssetReply>(&body)
        .map_err(UploadError::Decode)?
        .into_asset()
}

async fn produce<R>(
    form: Multipart,
    mut part: Part<R>,
    mut writer: DuplexStream,
    failed: oneshot::Sender<io::Error>,
    done: oneshot::Sender<Produced>,
) where
    R: AsyncRead + Unpin,
{
    let result = write_form(&form, &mut part, &mut writer).await;
    if let Err(e) = &result {
        tracing::debug!(file_name = %part.file_name, error = %e, "multipart producer failed");
        // The failure must reach the body before the pipe closes.
        let _ = failed.send(io::Error::other(format!("multipart producer failed: {e}")));
    }
    drop(writer);
    let _ = done.send(result);
}

/// Frame `part` into `pipe` and shut the pipe down.
async fn write_form<R>(form: &Multipart, part: &mut Part<R>, pipe: &mut DuplexStream) -> Produced
where
    R: AsyncRead + Unpin,
{
    pipe.write_all(form.part_header(FIELD_NAME, &part.file_name, &part.mime_type).as_bytes())
        .await
        .map_err(UploadError::Pipe)?;
    pipe.write_all(&part.head).await.map_err(UploadError::Pipe)?;

    let mut written = part.head.len() as u64;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = part.rest.read(&mut buf).await.map_err(UploadError::Read)?;
        if n == 0 {
            break;
        }
        pipe.write_all(&buf[..n]).await.map_err(UploadError::Pipe)?;
        written += n as u64;
    }

    pipe.write_all(form.trailer().as_bytes())
        .await
        .map_err(UploadError::Pipe)?;
    pipe.shutdown().await.map_err(UploadError::Pipe)?;

    Ok(written)
}
