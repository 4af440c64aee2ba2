//! Google Books catalog implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CatalogSettings;
use crate::models::{Book, BookBuilder, ModelError, SourceType};
use crate::sources::{parse_year, CatalogPage, Source, SourceError};
use crate::utils::{HttpClient, RequestPacer, RetryConfig};

/// Google Books caps `maxResults` at 40
const MAX_RESULTS_LIMIT: usize = 40;

/// Google Books catalog
///
/// Uses the `volumes` endpoint with an `inauthor:` query. An API key is
/// optional and only raises the quota.
#[derive(Debug, Clone)]
pub struct GoogleBooksSource {
    http: HttpClient,
    settings: CatalogSettings,
    retry: RetryConfig,
    pacer: RequestPacer,
    api_key: Option<String>,
}

impl GoogleBooksSource {
    /// Create a source from catalog settings
    pub fn new(
        http: HttpClient,
        settings: CatalogSettings,
        retry: RetryConfig,
        api_key: Option<String>,
    ) -> Self {
        let pacer = RequestPacer::per_second(settings.requests_per_second);
        Self {
            http,
            settings,
            retry,
            pacer,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Create a source against another base URL with default settings
    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Self {
        let settings = CatalogSettings {
            base_url: base_url.into(),
            ..crate::config::SourcesConfig::default().google_books
        };
        Self::new(http, settings, RetryConfig::default(), None)
    }

    /// Override the retry policy
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the number of records requested per page
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.settings.page_size = page_size;
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn max_results(&self) -> usize {
        self.settings.page_size.clamp(1, MAX_RESULTS_LIMIT)
    }

    fn search_url(&self, author: &str, page: usize) -> String {
        let max_results = self.max_results();
        let query = format!("inauthor:\"{}\"", author);
        let mut url = format!(
            "{}/volumes?q={}&startIndex={}&maxResults={}&printType=books",
            self.settings.base_url.trim_end_matches('/'),
            urlencoding::encode(&query),
            page * max_results,
            max_results
        );
        if let Some(ref key) = self.api_key {
            url.push_str(&format!("&key={}", urlencoding::encode(key)));
        }
        url
    }

    /// Map one volume to a book
    fn parse_volume(volume: &GBVolume) -> Result<Book, ModelError> {
        let info = &volume.volume_info;
        let year = info.published_date.as_deref().and_then(parse_year);

        let mut builder = BookBuilder::new(
            info.title.as_deref().unwrap_or_default(),
            SourceType::GoogleBooks,
        )
        .maybe_published_year(year);

        if let Some(link) = info
            .info_link
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .or(info.canonical_volume_link.as_deref())
        {
            builder = builder.url(link);
        }
        if let Some(thumbnail) = info
            .image_links
            .as_ref()
            .and_then(|links| links.thumbnail.as_deref())
        {
            builder = builder.thumbnail(thumbnail);
        }

        builder.build()
    }
}

impl Default for GoogleBooksSource {
    fn default() -> Self {
        Self::new(
            HttpClient::new(),
            crate::config::SourcesConfig::default().google_books,
            RetryConfig::default(),
            crate::config::ApiKeys::default().resolve_google_books(),
        )
    }
}

#[async_trait]
impl Source for GoogleBooksSource {
    fn source_type(&self) -> SourceType {
        SourceType::GoogleBooks
    }

    fn retry_config(&self) -> RetryConfig {
        self.retry
    }

    fn max_pages(&self) -> usize {
        self.settings.max_pages.max(1)
    }

    async fn fetch_page(&self, author: &str, page: usize) -> Result<CatalogPage, SourceError> {
        self.pacer.wait().await;

        let url = self.search_url(author, page);
        tracing::debug!(page, "Google Books request");
        let response: GBSearchResponse = self.http.get_json(&url).await?;

        let received = response.items.len();
        let books: Vec<Book> = response
            .items
            .iter()
            .filter_map(|volume| Self::parse_volume(volume).ok())
            .collect();

        let start_index = page * self.max_results();
        let has_more = received > 0 && start_index + received < response.total_items;

        Ok(CatalogPage {
            dropped: received - books.len(),
            books,
            has_more,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GBSearchResponse {
    #[serde(default)]
    total_items: usize,
    #[serde(default)]
    items: Vec<GBVolume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GBVolume {
    #[serde(default)]
    volume_info: GBVolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GBVolumeInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    info_link: Option<String>,
    #[serde(default)]
    canonical_volume_link: Option<String>,
    #[serde(default)]
    image_links: Option<GBImageLinks>,
}

#[derive(Debug, Deserialize)]
struct GBImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(5),
        }
    }

    fn source(server: &mockito::Server) -> GoogleBooksSource {
        GoogleBooksSource::with_base_url(HttpClient::new(), server.url())
            .retry(fast_retry())
            .page_size(2)
    }

    fn volume(title: &str, date: &str) -> serde_json::Value {
        json!({
            "volumeInfo": {
                "title": title,
                "publishedDate": date,
                "infoLink": format!("https://books.google.com/books?id={}", title.len()),
                "imageLinks": {"thumbnail": "http://books.google.com/books/content?id=x"}
            }
        })
    }

    #[tokio::test]
    async fn test_fetches_every_page() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/volumes")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "inauthor:\"Isaac Asimov\"".into()),
                Matcher::UrlEncoded("startIndex".into(), "0".into()),
                Matcher::UrlEncoded("maxResults".into(), "2".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "totalItems": 3,
                    "items": [volume("Foundation", "1951"), volume("I, Robot", "1950-12-02")]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/volumes")
            .match_query(Matcher::UrlEncoded("startIndex".into(), "2".into()))
            .with_header("content-type", "application/json")
            .with_body(
                json!({"totalItems": 3, "items": [volume("Nemesis", "")]}).to_string(),
            )
            .create_async()
            .await;

        let books = source(&server).fetch_all("Isaac Asimov").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        let years: Vec<_> = books.iter().map(|b| b.published_year()).collect();
        assert_eq!(years, vec![Some(1951), Some(1950), None]);
        assert_eq!(books[0].source(), SourceType::GoogleBooks);
        assert_eq!(books[0].url(), Some("https://books.google.com/books?id=10"));
        assert_eq!(
            books[0].thumbnail(),
            Some("http://books.google.com/books/content?id=x")
        );
    }

    #[tokio::test]
    async fn test_missing_items_means_no_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/volumes")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(json!({"kind": "books#volumes", "totalItems": 0}).to_string())
            .create_async()
            .await;

        let fetch = source(&server).fetch_with_report("Nobody At All").await;
        assert!(fetch.books.is_empty());
        assert!(fetch.report.is_success());
    }

    #[tokio::test]
    async fn test_canonical_link_fallback_and_untitled_volumes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/volumes")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "totalItems": 3,
                    "items": [
                        {"volumeInfo": {"publishedDate": "1982"}},
                        {"volumeInfo": {
                            "title": "Foundation's Edge",
                            "canonicalVolumeLink": "https://books.google.com/books/about/Foundation_s_Edge.html"
                        }},
                        {"volumeInfo": {
                            "title": "The Robots of Dawn",
                            "infoLink": "",
                            "canonicalVolumeLink": "https://books.google.com/books/about/The_Robots_of_Dawn.html"
                        }}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let page = source(&server).fetch_page("Isaac Asimov", 0).await.unwrap();
        assert_eq!(page.dropped, 1);
        assert_eq!(page.books.len(), 2);
        assert_eq!(
            page.books[0].url(),
            Some("https://books.google.com/books/about/Foundation_s_Edge.html")
        );
        assert_eq!(
            page.books[1].url(),
            Some("https://books.google.com/books/about/The_Robots_of_Dawn.html")
        );
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_rate_limit_recovers_on_retry() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/volumes")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let source = source(&server);

        assert!(matches!(
            source.fetch_page("Isaac Asimov", 0).await,
            Err(SourceError::RateLimit(None))
        ));
        limited.assert_async().await;
        limited.remove_async().await;

        server
            .mock("GET", "/volumes")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(json!({"totalItems": 1, "items": [volume("Foundation", "1951")]}).to_string())
            .create_async()
            .await;

        let books = source.fetch_by_author("Isaac Asimov").await;
        assert_eq!(books.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_retry_after_is_tolerated() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/volumes")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header("retry-after", "18446744073709551615")
            .expect(3)
            .create_async()
            .await;

        let fetch = source(&server).fetch_with_report("Isaac Asimov").await;

        limited.assert_async().await;
        assert!(fetch.books.is_empty());
        assert!(!fetch.report.is_success());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let forbidden = server
            .mock("GET", "/volumes")
            .match_query(Matcher::Any)
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let fetch = source(&server).fetch_with_report("Isaac Asimov").await;
        forbidden.assert_async().await;
        assert!(!fetch.report.is_success());
    }

    #[test]
    fn test_search_url_includes_key_and_caps_page_size() {
        let source = GoogleBooksSource::with_base_url(HttpClient::new(), "https://example.test/v1/")
            .page_size(500)
            .api_key("secret");
        let url = source.search_url("Ursula K. Le Guin", 2);

        assert!(url.starts_with("https://example.test/v1/volumes?q=inauthor%3A%22Ursula%20K.%20Le%20Guin%22"));
        assert!(url.contains("&startIndex=80&maxResults=40"));
        assert!(url.ends_with("&key=secret"));
    }
}
