//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{Book, BookBuilder, SourceType};
use crate::sources::{CatalogPage, Source, SourceError, DEFAULT_MAX_PAGES};
use crate::utils::RetryConfig;

/// A mock catalog that serves predefined pages.
#[derive(Debug)]
pub struct MockSource {
    source_type: SourceType,
    pages: Mutex<Vec<Vec<Book>>>,
    failure: Mutex<Option<(usize, SourceError)>>,
    endless: bool,
    delay: Option<Duration>,
    retry: RetryConfig,
    max_pages: usize,
    requests: AtomicUsize,
}

impl MockSource {
    /// Create a mock catalog with no books
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            pages: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            endless: false,
            delay: None,
            retry: RetryConfig {
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
                ..RetryConfig::no_retry()
            },
            max_pages: DEFAULT_MAX_PAGES,
            requests: AtomicUsize::new(0),
        }
    }

    /// Serve `books` as a single page
    pub fn with_books(self, books: Vec<Book>) -> Self {
        self.set_books(books);
        self
    }

    /// Serve one page per entry of `(title, year)` pairs
    pub fn with_pages(self, pages: Vec<Vec<(&str, Option<i32>)>>) -> Self {
        let source = self.source_type;
        let pages = pages
            .into_iter()
            .map(|page| {
                page.into_iter()
                    .map(|(title, year)| make_book(title, year, source))
                    .collect()
            })
            .collect();
        *self.pages.lock().unwrap_or_else(|e| e.into_inner()) = pages;
        self
    }

    /// Fail every request for `page` with `error`
    pub fn failing_on_page(self, page: usize, error: SourceError) -> Self {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some((page, error));
        self
    }

    /// Fail from the first page on
    pub fn failing(self, error: SourceError) -> Self {
        self.failing_on_page(0, error)
    }

    /// Keep reporting more pages, repeating the last one
    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    /// Sleep before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Replace the served books with a single page
    pub fn set_books(&self, books: Vec<Book>) {
        *self.pages.lock().unwrap_or_else(|e| e.into_inner()) = vec![books];
    }

    /// Stop failing
    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Number of page requests received so far
    pub fn page_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn retry_config(&self) -> RetryConfig {
        self.retry
    }

    fn max_pages(&self) -> usize {
        self.max_pages
    }

    async fn fetch_page(&self, _author: &str, page: usize) -> Result<CatalogPage, SourceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((failing_page, error)) = &*self.failure.lock().unwrap_or_else(|e| e.into_inner())
        {
            if *failing_page == page {
                return Err(error.clone());
            }
        }

        let pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        let books = if self.endless {
            pages.get(page).or_else(|| pages.last())
        } else {
            pages.get(page)
        }
        .cloned()
        .unwrap_or_default();

        Ok(CatalogPage {
            books,
            dropped: 0,
            has_more: self.endless || page + 1 < pages.len(),
        })
    }
}

/// Helper function to create a mock book for testing.
///
/// # Panics
///
/// Panics if `title` is blank.
pub fn make_book(title: &str, year: Option<i32>, source: SourceType) -> Book {
    let slug: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    BookBuilder::new(title, source)
        .maybe_published_year(year)
        .url(format!("https://example.com/{}/{}", source.id(), slug))
        .build()
        .expect("mock book title must not be blank")
}
