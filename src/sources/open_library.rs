//! Open Library catalog implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CatalogSettings;
use crate::models::{Book, BookBuilder, ModelError, SourceType};
use crate::sources::{year_from_value, CatalogPage, Source, SourceError};
use crate::utils::{HttpClient, RequestPacer, RetryConfig};

const COVERS_BASE: &str = "https://covers.openlibrary.org/b/id";
const SEARCH_FIELDS: &str = "key,title,first_publish_year,publish_year,cover_i";

/// Open Library catalog
///
/// Uses the `search.json` endpoint, whose `page` parameter is 1-based.
#[derive(Debug, Clone)]
pub struct OpenLibrarySource {
    http: HttpClient,
    settings: CatalogSettings,
    retry: RetryConfig,
    pacer: RequestPacer,
}

impl OpenLibrarySource {
    /// Create a source from catalog settings
    pub fn new(http: HttpClient, mut settings: CatalogSettings, retry: RetryConfig) -> Self {
        settings.page_size = settings.page_size.max(1);
        let pacer = RequestPacer::per_second(settings.requests_per_second);
        Self {
            http,
            settings,
            retry,
            pacer,
        }
    }

    /// Create a source against another base URL with default settings
    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Self {
        let settings = CatalogSettings {
            base_url: base_url.into(),
            ..crate::config::SourcesConfig::default().open_library
        };
        Self::new(http, settings, RetryConfig::default())
    }

    /// Override the retry policy
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the number of records requested per page
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.settings.page_size = page_size.max(1);
        self
    }

    fn search_url(&self, author: &str, page: usize) -> String {
        format!(
            "{}/search.json?author={}&page={}&limit={}&fields={}",
            self.settings.base_url.trim_end_matches('/'),
            urlencoding::encode(author),
            page + 1,
            self.settings.page_size,
            SEARCH_FIELDS
        )
    }

    /// Map one search document to a book
    fn parse_doc(&self, doc: &OLDoc) -> Result<Book, ModelError> {
        let title = doc.title.as_deref().unwrap_or_default();
        let year = doc
            .first_publish_year
            .as_ref()
            .and_then(year_from_value)
            .or_else(|| doc.publish_year.iter().find_map(year_from_value));

        let mut builder =
            BookBuilder::new(title, SourceType::OpenLibrary).maybe_published_year(year);

        if let Some(key) = doc.key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.url(format!(
                "{}{}",
                self.settings.base_url.trim_end_matches('/'),
                key
            ));
        }
        if let Some(cover) = doc.cover_i.filter(|c| *c > 0) {
            builder = builder.thumbnail(format!("{}/{}-M.jpg", COVERS_BASE, cover));
        }

        builder.build()
    }
}

impl Default for OpenLibrarySource {
    fn default() -> Self {
        Self::new(
            HttpClient::new(),
            crate::config::SourcesConfig::default().open_library,
            RetryConfig::default(),
        )
    }
}

#[async_trait]
impl Source for OpenLibrarySource {
    fn source_type(&self) -> SourceType {
        SourceType::OpenLibrary
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
        tracing::debug!("Open Library request: {}", url);
        let response: OLSearchResponse = self.http.get_json(&url).await?;

        let received = response.docs.len();
        let books: Vec<Book> = response
            .docs
            .iter()
            .filter_map(|doc| self.parse_doc(doc).ok())
            .collect();

        let start = response.start.unwrap_or(page * self.settings.page_size);
        let has_more = received > 0 && start + received < response.num_found;

        Ok(CatalogPage {
            dropped: received - books.len(),
            books,
            has_more,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OLSearchResponse {
    #[serde(rename = "numFound", alias = "num_found", default)]
    num_found: usize,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    docs: Vec<OLDoc>,
}

#[derive(Debug, Deserialize)]
struct OLDoc {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    first_publish_year: Option<serde_json::Value>,
    #[serde(default)]
    publish_year: Vec<serde_json::Value>,
    #[serde(default)]
    cover_i: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(5),
        }
    }

    fn source(server: &mockito::Server) -> OpenLibrarySource {
        OpenLibrarySource::with_base_url(HttpClient::new(), server.url())
            .retry(fast_retry())
            .page_size(2)
    }

    fn page_query(page: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("author".into(), "Isaac Asimov".into()),
            Matcher::UrlEncoded("page".into(), page.into()),
            Matcher::UrlEncoded("limit".into(), "2".into()),
        ])
    }

    #[tokio::test]
    async fn test_fetches_every_page() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/search.json")
            .match_query(page_query("1"))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "numFound": 3,
                    "start": 0,
                    "docs": [
                        {"key": "/works/OL46125W", "title": "Foundation",
                         "first_publish_year": 1951, "cover_i": 12345},
                        {"key": "/works/OL46126W", "title": "I, Robot",
                         "publish_year": [1950, 1951]}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/search.json")
            .match_query(page_query("2"))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "numFound": 3,
                    "start": 2,
                    "docs": [{"key": "/works/OL46127W", "title": "The Gods Themselves"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let books = source(&server).fetch_all("Isaac Asimov").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(books.len(), 3);

        assert_eq!(books[0].title(), "Foundation");
        assert_eq!(books[0].published_year(), Some(1951));
        assert_eq!(
            books[0].url(),
            Some(format!("{}/works/OL46125W", server.url()).as_str())
        );
        assert_eq!(
            books[0].thumbnail(),
            Some("https://covers.openlibrary.org/b/id/12345-M.jpg")
        );
        assert_eq!(books[0].source(), SourceType::OpenLibrary);

        // falls back to the first listed publish year
        assert_eq!(books[1].published_year(), Some(1950));
        assert_eq!(books[1].thumbnail(), None);
        assert_eq!(books[2].published_year(), None);
    }

    #[tokio::test]
    async fn test_untitled_records_are_dropped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "numFound": 3,
                    "start": 0,
                    "docs": [
                        {"key": "/works/OL1W"},
                        {"key": "/works/OL2W", "title": "   "},
                        {"key": "/works/OL3W", "title": "Nightfall"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let page = source(&server)
            .page_size(10)
            .fetch_page("Isaac Asimov", 0)
            .await
            .unwrap();

        assert_eq!(page.books.len(), 1);
        assert_eq!(page.books[0].title(), "Nightfall");
        assert_eq!(page.dropped, 2);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_empty_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(json!({"numFound": 0, "start": 0, "docs": []}).to_string())
            .create_async()
            .await;

        let fetch = source(&server).fetch_with_report("Nobody").await;
        assert!(fetch.books.is_empty());
        assert!(fetch.report.is_success());
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_reported() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let fetch = source(&server).fetch_with_report("Isaac Asimov").await;

        failing.assert_async().await;
        assert!(fetch.books.is_empty());
        assert!(!fetch.report.is_success());
        assert!(fetch
            .report
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("500"));
    }

    #[tokio::test]
    async fn test_failure_on_later_page_discards_earlier_pages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(page_query("1"))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "numFound": 4,
                    "start": 0,
                    "docs": [{"title": "Foundation"}, {"title": "I, Robot"}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/search.json")
            .match_query(page_query("2"))
            .with_status(503)
            .create_async()
            .await;

        assert!(source(&server).fetch_by_author("Isaac Asimov").await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let fetch = source(&server).fetch_with_report("Isaac Asimov").await;
        assert!(fetch.books.is_empty());
        assert!(fetch
            .report
            .error
            .as_deref()
            .unwrap_or_default()
            .starts_with("Parse error"));
    }

    #[tokio::test]
    async fn test_zero_page_size_from_settings_still_advances() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "numFound": 2,
                    "docs": [{"key": "/works/OL1W", "title": "Foundation", "first_publish_year": 1951}]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "numFound": 2,
                    "docs": [{"key": "/works/OL2W", "title": "I, Robot", "first_publish_year": 1950}]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let settings = CatalogSettings {
            base_url: server.url(),
            page_size: 0,
            ..crate::config::SourcesConfig::default().open_library
        };
        let source = OpenLibrarySource::new(HttpClient::new(), settings, fast_retry());
        let books = source.fetch_by_author("Isaac Asimov").await;

        assert_eq!(books.len(), 2);
        first.assert_async().await;
        second.assert_async().await;
    }
}
