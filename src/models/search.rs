//! Search result, per-source report and page models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::book::{Book, SourceType};

/// Outcome of querying one catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Success,
    Error,
    Timeout,
}

/// What happened when a single catalog was queried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub status: SourceStatus,

    /// Number of books the catalog contributed before merging
    pub count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceReport {
    pub fn success(count: usize) -> Self {
        Self {
            status: SourceStatus::Success,
            count,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SourceStatus::Error,
            count: 0,
            error: Some(message.into()),
        }
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self {
            status: SourceStatus::Timeout,
            count: 0,
            error: Some(format!("timed out after {:?}", after)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SourceStatus::Success
    }
}

/// Books fetched from one catalog together with its report
#[derive(Debug, Clone)]
pub struct SourceFetch {
    pub source: SourceType,
    pub books: Vec<Book>,
    pub report: SourceReport,
}

/// Merged result of searching every catalog for one author.
///
/// Books are deduplicated by normalized title and ordered newest first,
/// books without a year last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    author: String,
    books: Vec<Book>,
    sources: BTreeMap<String, SourceReport>,
}

impl SearchResult {
    pub fn new(
        author: impl Into<String>,
        books: Vec<Book>,
        sources: BTreeMap<String, SourceReport>,
    ) -> Self {
        Self {
            author: author.into(),
            books,
            sources,
        }
    }

    /// Result with no books and no source reports
    pub fn empty(author: impl Into<String>) -> Self {
        Self::new(author, Vec::new(), BTreeMap::new())
    }

    /// The normalized author name that was searched
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn into_books(self) -> Vec<Book> {
        self.books
    }

    /// Per-catalog reports keyed by source id
    pub fn sources(&self) -> &BTreeMap<String, SourceReport> {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// True when catalogs were queried and none of them succeeded
    pub fn all_sources_failed(&self) -> bool {
        !self.sources.is_empty() && self.sources.values().all(|r| !r.is_success())
    }
}

/// One page of a [`SearchResult`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Zero-based page index that was requested
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub has_more: bool,
    pub books: Vec<Book>,
}
