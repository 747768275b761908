//! Photo provider client.
//!
//! Keyword search against the Unsplash API, trimmed to the few results a
//! picker shows and mapped onto [`ImageDescriptor`]s for the editor.

use annotator_core::ImageDescriptor;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// How many search results are kept.
pub const RESULT_LIMIT: usize = 4;

const SEARCH_PATH: &str = "search/photos";

/// Errors that can occur when talking to the photo provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider base URL is invalid.
    #[error("invalid provider URL: {0}")]
    InvalidUrl(String),
    /// No access key was configured.
    #[error("photo provider access key is not set (UNSPLASH_ACCESS_KEY)")]
    MissingAccessKey,
    /// HTTP layer failed (connection, timeout, payload decode).
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider answered with a non-success status.
    #[error("provider returned status {0}")]
    Status(u16),
    /// The search matched nothing.
    #[error("no photos found for \"{0}\"")]
    NoResults(String),
    /// The requested result index is past the end of the results.
    #[error("result {pick} requested but only {available} available")]
    PickOutOfRange {
        /// Requested 0-based index.
        pick: usize,
        /// Number of results returned.
        available: usize,
    },
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<PhotoResult>,
}

#[derive(Debug, Deserialize)]
struct PhotoResult {
    id: String,
    urls: PhotoUrls,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    alt_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
    thumb: String,
}

impl From<PhotoResult> for ImageDescriptor {
    fn from(photo: PhotoResult) -> Self {
        Self {
            id: photo.id,
            full_url: photo.urls.regular,
            thumb_url: photo.urls.thumb,
            description: photo.description.or(photo.alt_description),
        }
    }
}

/// Client for the Unsplash photo search endpoint.
#[derive(Clone)]
pub struct UnsplashClient {
    http: Client,
    endpoint: Url,
    access_key: String,
}

impl UnsplashClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidUrl`] if `base_url` is malformed.
    /// - [`ProviderError::MissingAccessKey`] if no non-empty key is given.
    /// - [`ProviderError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: &str, access_key: Option<&str>) -> Result<Self, ProviderError> {
        let access_key = access_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::MissingAccessKey)?
            .to_string();

        let mut endpoint =
            Url::parse(base_url).map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
        let path = format!("{}/{SEARCH_PATH}", endpoint.path().trim_end_matches('/'));
        endpoint.set_path(&path);

        let http = Client::builder()
            .user_agent(concat!("photo-annotator/", env!("CARGO_PKG_VERSION")))
            .timeout(crate::fetch::FETCH_TIMEOUT)
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_key,
        })
    }

    /// Search endpoint this client queries.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Search for photos matching `query`, keeping at most [`RESULT_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the provider answers with a
    /// non-success status, or the payload is not a search response.
    pub async fn search(&self, query: &str) -> Result<Vec<ImageDescriptor>, ProviderError> {
        tracing::debug!("Searching provider for {:?}", query);
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("page", "1"),
                ("query", query),
                ("client_id", self.access_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let payload: SearchResponse = response.json().await?;
        let results: Vec<ImageDescriptor> = payload
            .results
            .into_iter()
            .take(RESULT_LIMIT)
            .map(ImageDescriptor::from)
            .collect();
        tracing::info!("Provider returned {} result(s) for {:?}", results.len(), query);
        for (index, result) in results.iter().enumerate() {
            tracing::debug!("[{}] {} {}", index, result.thumb_url, result.id);
        }
        Ok(results)
    }

    /// Search and return the result at index `pick`.
    ///
    /// # Errors
    ///
    /// Besides the [`UnsplashClient::search`] errors, returns
    /// [`ProviderError::NoResults`] for an empty result list and
    /// [`ProviderError::PickOutOfRange`] when `pick` is past its end.
    pub async fn pick(&self, query: &str, pick: usize) -> Result<ImageDescriptor, ProviderError> {
        let mut results = self.search(query).await?;
        if results.is_empty() {
            return Err(ProviderError::NoResults(query.to_string()));
        }
        let available = results.len();
        if pick >= available {
            return Err(ProviderError::PickOutOfRange { pick, available });
        }
        Ok(results.swap_remove(pick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn photo(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "description": null,
            "alt_description": format!("alt {id}"),
            "urls": {
                "raw": format!("https://img.example/{id}?raw"),
                "regular": format!("https://img.example/{id}?w=1080"),
                "thumb": format!("https://img.example/{id}?w=200"),
            }
        })
    }

    async fn mount_results(server: &MockServer, ids: &[&str]) {
        let results: Vec<_> = ids.iter().map(|id| photo(id)).collect();
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .and(query_param("page", "1"))
            .and(query_param("query", "mountains"))
            .and(query_param("client_id", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": ids.len(),
                "total_pages": 1,
                "results": results,
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn missing_access_key_is_rejected() {
        let err = UnsplashClient::new("https://api.unsplash.com", None)
            .err()
            .expect("error");
        assert!(matches!(err, ProviderError::MissingAccessKey));

        let err = UnsplashClient::new("https://api.unsplash.com", Some("  "))
            .err()
            .expect("error");
        assert!(matches!(err, ProviderError::MissingAccessKey));
    }

    #[test]
    fn endpoint_appends_search_path() {
        let client =
            UnsplashClient::new("https://api.unsplash.com", Some("k")).expect("client");
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.unsplash.com/search/photos"
        );

        let client =
            UnsplashClient::new("https://proxy.example/unsplash/", Some("k")).expect("client");
        assert_eq!(client.endpoint().path(), "/unsplash/search/photos");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = UnsplashClient::new("not a url", Some("k")).err().expect("error");
        assert!(matches!(err, ProviderError::InvalidUrl(_)));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn search_keeps_first_four_results() {
        let server = MockServer::start().await;
        mount_results(&server, &["a", "b", "c", "d", "e", "f"]).await;

        let client = UnsplashClient::new(&server.uri(), Some("test-key")).expect("client");
        let results = client.search("mountains").await.expect("results");

        assert_eq!(results.len(), RESULT_LIMIT);
        let ids: Vec<_> = results.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        assert_eq!(results[0].full_url, "https://img.example/a?w=1080");
        assert_eq!(results[0].thumb_url, "https://img.example/a?w=200");
        assert_eq!(results[0].description.as_deref(), Some("alt a"));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn pick_selects_and_bounds_checks() {
        let server = MockServer::start().await;
        mount_results(&server, &["a", "b"]).await;

        let client = UnsplashClient::new(&server.uri(), Some("test-key")).expect("client");
        let picked = client.pick("mountains", 1).await.expect("picked");
        assert_eq!(picked.id, "b");

        let err = client.pick("mountains", 2).await.unwrap_err();
        match err {
            ProviderError::PickOutOfRange { pick, available } => {
                assert_eq!((pick, available), (2, 2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn empty_results_are_reported() {
        let server = MockServer::start().await;
        mount_results(&server, &[]).await;

        let client = UnsplashClient::new(&server.uri(), Some("test-key")).expect("client");
        let err = client.pick("mountains", 0).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoResults(q) if q == "mountains"));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = UnsplashClient::new(&server.uri(), Some("bad-key")).expect("client");
        let err = client.search("mountains").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status(401)));
    }
}
