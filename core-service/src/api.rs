//! Remote catalog API
//!
//! [`CatalogApi`] is the remote source every entity binding refreshes from.
//! [`HttpCatalogApi`] implements it over the host [`HttpClient`] with JSON
//! payloads. Calls return raw [`BridgeError`]s; classification into the
//! remote error taxonomy happens in the bindings through `RemoteCaller`.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpRequest};
use core_library::models::{
    Category, Comment, Favorite, SearchHistoryEntry, Video, VideoFilter, WatchHistoryEntry,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// One page of the catalog, narrowed by `filter`
    async fn fetch_videos(&self, filter: &VideoFilter, page: u32, page_size: u32)
        -> Result<Vec<Video>>;

    async fn fetch_video(&self, id: &str) -> Result<Video>;

    /// Full records for `ids`. Unknown ids are left out of the response.
    async fn fetch_videos_by_ids(&self, ids: &[String]) -> Result<Vec<Video>>;

    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    async fn fetch_comments(&self, video_id: &str, page: u32, page_size: u32)
        -> Result<Vec<Comment>>;

    async fn fetch_favorites(&self) -> Result<Vec<Favorite>>;

    async fn fetch_watch_history(&self) -> Result<Vec<WatchHistoryEntry>>;

    async fn fetch_search_history(&self) -> Result<Vec<SearchHistoryEntry>>;

    async fn search(&self, query: &str, page: u32, page_size: u32) -> Result<Vec<Video>>;
}

/// JSON-over-HTTP catalog API.
///
/// # Example
///
/// ```ignore
/// use core_service::api::HttpCatalogApi;
///
/// let api = HttpCatalogApi::new(http_client, "https://api.example.com/v1")
///     .with_token("secret");
/// let categories = api.fetch_categories().await?;
/// ```
pub struct HttpCatalogApi {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_token: Option<String>,
}

impl HttpCatalogApi {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    fn request(&self, path: &str) -> HttpRequest {
        let request = HttpRequest::get(format!("{}/{}", self.base_url, path))
            .header("Accept", "application/json");

        match &self.api_token {
            Some(token) => request.bearer_token(token.clone()),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        debug!(url = %request.url, "Requesting catalog API");
        let response = self.http_client.execute(request).await?.error_for_status()?;
        response.json()
    }
}

fn paged(request: HttpRequest, page: u32, page_size: u32) -> HttpRequest {
    request
        .query_param("page", page)
        .query_param("size", page_size)
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    #[instrument(skip(self))]
    async fn fetch_videos(
        &self,
        filter: &VideoFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Video>> {
        let mut request = self.request("videos");
        if let Some(video_type) = &filter.video_type {
            request = request.query_param("type", video_type);
        }
        if let Some(category_id) = &filter.category_id {
            request = request.query_param("category", category_id);
        }
        if let Some(year) = filter.year {
            request = request.query_param("year", year);
        }

        self.get_json(paged(request, page, page_size)).await
    }

    #[instrument(skip(self))]
    async fn fetch_video(&self, id: &str) -> Result<Video> {
        if id.trim().is_empty() {
            return Err(BridgeError::OperationFailed("Video id cannot be empty".to_string()));
        }

        self.get_json(self.request(&format!("videos/{}", urlencoding::encode(id))))
            .await
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn fetch_videos_by_ids(&self, ids: &[String]) -> Result<Vec<Video>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.request("videos").query_param("ids", ids.join(","));
        self.get_json(request).await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.get_json(self.request("categories")).await
    }

    #[instrument(skip(self))]
    async fn fetch_comments(
        &self,
        video_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Comment>> {
        let request = self.request(&format!("videos/{}/comments", urlencoding::encode(video_id)));
        self.get_json(paged(request, page, page_size)).await
    }

    async fn fetch_favorites(&self) -> Result<Vec<Favorite>> {
        self.get_json(self.request("me/favorites")).await
    }

    async fn fetch_watch_history(&self) -> Result<Vec<WatchHistoryEntry>> {
        self.get_json(self.request("me/history/watch")).await
    }

    async fn fetch_search_history(&self) -> Result<Vec<SearchHistoryEntry>> {
        self.get_json(self.request("me/history/search")).await
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, page: u32, page_size: u32) -> Result<Vec<Video>> {
        let request = self.request("search").query_param("q", query);
        self.get_json(paged(request, page, page_size)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::http::{HttpMethod, HttpResponse};
    use bytes::Bytes;
    use mockall::mock;
    use mockall::predicate::function;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn respond(status: u16, body: &'static str) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body),
        })
    }

    fn has_param(request: &HttpRequest, key: &str, value: &str) -> bool {
        request
            .query
            .iter()
            .any(|(k, v)| k == key && v == value)
    }

    #[core_async::test]
    async fn test_fetch_videos_sends_filter_and_paging() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .with(function(|request: &HttpRequest| {
                request.method == HttpMethod::Get
                    && request.url == "https://api.test/v1/videos"
                    && has_param(request, "type", "movie")
                    && has_param(request, "year", "2020")
                    && has_param(request, "page", "2")
                    && has_param(request, "size", "20")
                    && !request.query.iter().any(|(k, _)| k == "category")
            }))
            .times(1)
            .returning(|_| respond(200, r#"[{"id":"v1","title":"One","video_type":"movie","version":3}]"#));

        let api = HttpCatalogApi::new(Arc::new(http), "https://api.test/v1/");
        let filter = VideoFilter::new().with_type("movie").with_year(2020);
        let videos = api.fetch_videos(&filter, 2, 20).await.unwrap();

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, "v1");
        assert_eq!(videos[0].version, 3);
    }

    #[core_async::test]
    async fn test_token_is_sent_as_bearer() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .with(function(|request: &HttpRequest| {
                request.headers.get("Authorization").map(String::as_str) == Some("Bearer secret")
            }))
            .times(1)
            .returning(|_| respond(200, "[]"));

        let api = HttpCatalogApi::new(Arc::new(http), "https://api.test").with_token("secret");
        assert!(api.fetch_categories().await.unwrap().is_empty());
    }

    #[core_async::test]
    async fn test_server_error_keeps_status_and_body() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .returning(|_| respond(503, "maintenance"));

        let api = HttpCatalogApi::new(Arc::new(http), "https://api.test");
        match api.fetch_favorites().await {
            Err(BridgeError::Http { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body.as_deref(), Some("maintenance"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[core_async::test]
    async fn test_malformed_body_is_decode_error() {
        let mut http = MockHttpClient::new();
        http.expect_execute().returning(|_| respond(200, "{not json"));

        let api = HttpCatalogApi::new(Arc::new(http), "https://api.test");
        assert!(matches!(
            api.fetch_watch_history().await,
            Err(BridgeError::Decode(_))
        ));
    }

    #[core_async::test]
    async fn test_fetch_by_ids_skips_empty_request() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let api = HttpCatalogApi::new(Arc::new(http), "https://api.test");
        assert!(api.fetch_videos_by_ids(&[]).await.unwrap().is_empty());
    }

    #[core_async::test]
    async fn test_fetch_by_ids_joins_ids() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .with(function(|request: &HttpRequest| has_param(request, "ids", "a,b")))
            .times(1)
            .returning(|_| respond(200, "[]"));

        let api = HttpCatalogApi::new(Arc::new(http), "https://api.test");
        let ids = vec!["a".to_string(), "b".to_string()];
        api.fetch_videos_by_ids(&ids).await.unwrap();
    }

    #[core_async::test]
    async fn test_search_and_comments_paths() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .with(function(|request: &HttpRequest| {
                request.url == "https://api.test/search" && has_param(request, "q", "cats")
            }))
            .times(1)
            .returning(|_| respond(200, "[]"));
        http.expect_execute()
            .with(function(|request: &HttpRequest| {
                request.url == "https://api.test/videos/v1/comments" && has_param(request, "page", "1")
            }))
            .times(1)
            .returning(|_| respond(200, "[]"));

        let api = HttpCatalogApi::new(Arc::new(http), "https://api.test");
        api.search("cats", 1, 10).await.unwrap();
        api.fetch_comments("v1", 1, 10).await.unwrap();
    }

    #[core_async::test]
    async fn test_ids_are_encoded_as_one_path_segment() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .with(function(|request: &HttpRequest| {
                request.url == "https://api.test/videos/a%2Fb%3Fc%23d"
            }))
            .times(1)
            .returning(|_| respond(200, r#"{"id":"a/b?c#d","title":"Odd","video_type":"movie"}"#));
        http.expect_execute()
            .with(function(|request: &HttpRequest| {
                request.url == "https://api.test/videos/a%2Fb/comments"
            }))
            .times(1)
            .returning(|_| respond(200, "[]"));

        let api = HttpCatalogApi::new(Arc::new(http), "https://api.test");
        let video = api.fetch_video("a/b?c#d").await.unwrap();
        assert_eq!(video.id, "a/b?c#d");
        api.fetch_comments("a/b", 1, 10).await.unwrap();
    }
}
