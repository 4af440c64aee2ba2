//! Catalog source plugins.
//!
//! Every catalog implements the [`Source`] trait. A source only has to know
//! how to fetch one upstream page of results for an author; the trait's
//! provided methods walk every page, retry transient failures and turn a
//! failed catalog into an empty result with an error report, so callers never
//! see a catalog error.
//!
//! # Runtime Source Configuration
//!
//! Both catalogs are enabled by default. Use these environment variables (or
//! the `[sources]` table of the config file) to control which are used:
//!
//! - `BOOK_FINDER_SOURCES__ENABLED_SOURCES` - Only use these catalogs (e.g., "open_library")
//! - `BOOK_FINDER_SOURCES__DISABLED_SOURCES` - Never use these catalogs (e.g., "google_books")
//!
//! `DISABLED_SOURCES` always takes precedence.

mod google_books;
mod open_library;
mod registry;

pub mod mock;

pub use google_books::GoogleBooksSource;
pub use mock::MockSource;
pub use open_library::OpenLibrarySource;
pub use registry::SourceRegistry;

use async_trait::async_trait;

use crate::models::{Book, SourceFetch, SourceReport, SourceType};
use crate::utils::{with_retry, RetryConfig};

/// Fallback ceiling on upstream pages fetched for one author
pub const DEFAULT_MAX_PAGES: usize = 100;

/// One upstream page of results, already mapped to books
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub books: Vec<Book>,

    /// Records skipped because they had no usable title
    pub dropped: usize,

    /// Whether the catalog has further pages
    pub has_more: bool,
}

/// The Source trait defines the interface for all catalog plugins.
///
/// # Implementing a New Source
///
/// 1. Add a variant to [`SourceType`]
/// 2. Implement `source_type` and `fetch_page`
/// 3. Override `retry_config` / `max_pages` if the defaults do not fit
/// 4. Build it in `SourceRegistry::from_config`
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Which catalog this is
    fn source_type(&self) -> SourceType;

    /// Unique identifier for this source (e.g. "open_library")
    fn id(&self) -> &str {
        self.source_type().id()
    }

    /// Human-readable name of this source
    fn name(&self) -> &str {
        self.source_type().name()
    }

    /// Retry policy applied to each upstream page request
    fn retry_config(&self) -> RetryConfig {
        RetryConfig::default()
    }

    /// Upper bound on pages fetched for one author
    fn max_pages(&self) -> usize {
        DEFAULT_MAX_PAGES
    }

    /// Fetch one page (zero-based) of books by `author`
    async fn fetch_page(&self, author: &str, page: usize) -> Result<CatalogPage, SourceError>;

    /// Fetch every page of books by `author`.
    ///
    /// Any page failing after retries fails the whole fetch; pages fetched
    /// before the failure are discarded.
    async fn fetch_all(&self, author: &str) -> Result<Vec<Book>, SourceError> {
        let author = author.trim();
        let retry = self.retry_config();
        let mut books = Vec::new();
        let mut dropped = 0;

        for page in 0..self.max_pages() {
            let fetched = with_retry(retry, || self.fetch_page(author, page)).await?;

            dropped += fetched.dropped;
            books.extend(fetched.books);

            if !fetched.has_more {
                tracing::debug!(
                    source = self.id(),
                    pages = page + 1,
                    books = books.len(),
                    dropped,
                    "Fetched all pages"
                );
                return Ok(books);
            }
        }

        tracing::warn!(
            source = self.id(),
            max_pages = self.max_pages(),
            books = books.len(),
            "Stopped paging at the page limit"
        );
        Ok(books)
    }

    /// Fetch every book by `author`, converting failure into an empty result
    async fn fetch_with_report(&self, author: &str) -> SourceFetch {
        match self.fetch_all(author).await {
            Ok(books) => SourceFetch {
                source: self.source_type(),
                report: SourceReport::success(books.len()),
                books,
            },
            Err(e) => {
                tracing::warn!(source = self.id(), error = %e, "Source unavailable");
                SourceFetch {
                    source: self.source_type(),
                    books: Vec::new(),
                    report: SourceReport::error(e.to_string()),
                }
            }
        }
    }

    /// Fetch every book by `author`; an unavailable catalog yields no books
    async fn fetch_by_author(&self, author: &str) -> Vec<Book> {
        self.fetch_with_report(author).await.books
    }
}

/// Errors that can occur when talking to a catalog.
///
/// These never escape a [`Source`]'s provided fetch methods.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Rate limit exceeded, with the server's retry-after hint in seconds
    #[error("Rate limit exceeded")]
    RateLimit(Option<u64>),

    /// 5xx response
    #[error("Server error: HTTP {0}")]
    Server(u16),

    /// Other unexpected response from the catalog
    #[error("API error: {0}")]
    Api(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// Parse a year from a catalog date or year string ("1951", "1951-05", "1951-05-01")
pub(crate) fn parse_year(raw: &str) -> Option<i32> {
    raw.trim().split('-').next()?.trim().parse().ok()
}

/// Parse a year from a JSON number or string
pub(crate) fn year_from_value(value: &serde_json::Value) -> Option<i32> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        serde_json::Value::String(s) => parse_year(s),
        _ => None,
    }
}
