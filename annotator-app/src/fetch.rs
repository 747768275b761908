//! Photo byte retrieval.
//!
//! The session only needs "give me the bytes behind this URL", so the network
//! sits behind [`ImageFetcher`] and tests can gate completions by hand.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Request timeout for a single photo download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching photo bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed.
    #[error("invalid photo URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, body read).
    #[error("photo request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("photo request to {url} returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// Reading a local file failed.
    #[error("failed to read photo file: {0}")]
    Io(#[from] std::io::Error),
    /// The URL scheme is not one the fetcher can retrieve.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Source of raw photo bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Retrieve the encoded bytes behind `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetcher for `http`, `https` and `file` URLs.
///
/// Requests are anonymous: no cookies and no credentials are sent, so the
/// resulting image is never tainted by a cross-origin session.
#[derive(Clone)]
pub struct HttpImageFetcher {
    http: Client,
}

impl HttpImageFetcher {
    /// Create a fetcher with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client fails to build.
    pub fn new() -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("photo-annotator/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;
        Ok(Self { http })
    }

    async fn fetch_http(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        tracing::debug!(url = %url, bytes = bytes.len(), "Fetched photo");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => self.fetch_http(parsed).await,
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|()| FetchError::InvalidUrl(url.to_string()))?;
                Ok(tokio::fs::read(path).await?)
            }
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn rejects_unparseable_url() {
        let fetcher = HttpImageFetcher::new().expect("fetcher");
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_scheme() {
        let fetcher = HttpImageFetcher::new().expect("fetcher");
        let err = fetcher.fetch("ftp://host/photo.png").await.unwrap_err();
        match err {
            FetchError::UnsupportedScheme(scheme) => assert_eq!(scheme, "ftp"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reads_file_urls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("photo.bin");
        std::fs::write(&file, [1u8, 2, 3]).expect("write");
        let url = Url::from_file_path(&file).expect("file url");

        let fetcher = HttpImageFetcher::new().expect("fetcher");
        let bytes = fetcher.fetch(url.as_str()).await.expect("bytes");
        assert_eq!(bytes, [1, 2, 3]);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn fetches_http_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8, 8, 7]))
            .mount(&server)
            .await;

        let fetcher = HttpImageFetcher::new().expect("fetcher");
        let bytes = fetcher
            .fetch(&format!("{}/photo.png", server.uri()))
            .await
            .expect("bytes");
        assert_eq!(bytes, [9, 8, 7]);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpImageFetcher::new().expect("fetcher");
        let err = fetcher
            .fetch(&format!("{}/missing.png", server.uri()))
            .await
            .unwrap_err();
        match err {
            FetchError::Status { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
