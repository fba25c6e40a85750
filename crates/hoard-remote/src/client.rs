use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

use crate::asset::AssetAttachment;
use crate::bookmark::{Bookmark, NewBookmark};
use crate::error::{ApiError, Result};
use crate::upload::Uploader;

/// Bookmark service client rooted at `<base>/api/v1`.
///
/// The bearer token lives in the underlying `reqwest::Client` as a default
/// header, so clones share both the connection pool and the credentials.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api: Url,
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            token: None,
            timeout: None,
        }
    }

    /// Wrap an already configured client. `base_url` is the server root,
    /// without the `/api/v1` suffix.
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            api: api_root(base_url)?,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// An [`Uploader`] posting to this client's asset endpoint.
    pub fn uploader(&self) -> Uploader {
        Uploader::new(self.http.clone(), self.endpoint(&["assets"]))
    }

    pub async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark> {
        let response = self
            .http
            .post(self.endpoint(&["bookmarks"]))
            .json(bookmark)
            .send()
            .await?;
        let created: Bookmark = decode(response).await?;

        tracing::info!(
            bookmark_id = %created.id,
            tagging_status = %created.tagging_status,
            kind = bookmark.kind(),
            "created bookmark"
        );
        Ok(created)
    }

    pub async fn bookmark(&self, id: &str) -> Result<Bookmark> {
        let response = self
            .http
            .get(self.endpoint(&["bookmarks", id]))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn attach_asset(&self, bookmark_id: &str, attachment: &AssetAttachment) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint(&["bookmarks", bookmark_id, "assets"]))
            .json(attachment)
            .send()
            .await?;
        check(response).await?;

        tracing::debug!(bookmark_id, asset_id = %attachment.id, "attached asset");
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api.clone();
        // `api` is always http(s), so it can be a base.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

pub struct ApiClientBuilder {
    base_url: String,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Per-request timeout. Unset means no client-side limit.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        ApiClient::new(builder.build()?, &self.base_url)
    }
}

/// Parse `base_url` and append `/api/v1` to its path.
pub(crate) fn api_root(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::UnsupportedScheme(url.scheme().to_owned()));
    }
    if !url.has_host() {
        return Err(ApiError::MissingHost);
    }

    let path = format!("{}/api/v1", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

async fn check(response: reqwest::Response) -> Result<Bytes> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(body)
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = check(response).await?;
    serde_json::from_slice(&body).map_err(ApiError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_root_appends_version_path() {
        assert_eq!(
            api_root("http://localhost:3000").unwrap().as_str(),
            "http://localhost:3000/api/v1"
        );
        assert_eq!(
            api_root("https://example.com/keep/").unwrap().as_str(),
            "https://example.com/keep/api/v1"
        );
    }

    #[test]
    fn api_root_rejects_non_web_urls() {
        assert!(matches!(api_root("ftp://example.com"), Err(ApiError::UnsupportedScheme(_))));
        assert!(matches!(api_root("not a url"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn endpoints_are_nested_under_api_root() {
        let client = ApiClient::new(reqwest::Client::new(), "http://h:1").unwrap();
        assert_eq!(
            client.endpoint(&["bookmarks", "b1", "assets"]).as_str(),
            "http://h:1/api/v1/bookmarks/b1/assets"
        );
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let err = ApiClient::builder("http://h").token("bad\ntoken").build().unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }
}
