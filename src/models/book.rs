//! Book model representing one book result from any catalog.

use serde::{Deserialize, Serialize};

/// The catalog a book record was fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    OpenLibrary,
    GoogleBooks,
}

impl SourceType {
    /// All supported catalogs, in registry order
    pub const ALL: [SourceType; 2] = [SourceType::OpenLibrary, SourceType::GoogleBooks];

    /// Returns the display name of the catalog
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::OpenLibrary => "Open Library",
            SourceType::GoogleBooks => "Google Books",
        }
    }

    /// Returns the catalog identifier (used in config and JSON output)
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::OpenLibrary => "open_library",
            SourceType::GoogleBooks => "google_books",
        }
    }

    /// Look up a catalog by its identifier
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "open_library" | "openlibrary" => Some(SourceType::OpenLibrary),
            "google_books" | "googlebooks" => Some(SourceType::GoogleBooks),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors raised while constructing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("book title is empty")]
    EmptyTitle,
}

/// A single book result.
///
/// Books are immutable once built: every field is private and only readable
/// through accessors. Use [`BookBuilder`] to construct one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BookRecord")]
pub struct Book {
    title: String,
    published_year: Option<i32>,
    url: Option<String>,
    thumbnail: Option<String>,
    source: SourceType,
}

impl Book {
    /// Book title, trimmed and never empty
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Year of first publication, when the catalog reports one
    pub fn published_year(&self) -> Option<i32> {
        self.published_year
    }

    /// Absolute URL of the catalog page for this book
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Absolute URL of a cover image
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    /// Catalog this record came from
    pub fn source(&self) -> SourceType {
        self.source
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.published_year {
            Some(year) => write!(f, "{} ({})", self.title, year)?,
            None => write!(f, "{} (Unknown)", self.title)?,
        }
        if let Some(url) = &self.url {
            write!(f, " - {}", url)?;
        }
        Ok(())
    }
}

/// Builder for constructing [`Book`] values
#[derive(Debug, Clone)]
pub struct BookBuilder {
    title: String,
    published_year: Option<i32>,
    url: Option<String>,
    thumbnail: Option<String>,
    source: SourceType,
}

impl BookBuilder {
    /// Create a new builder with the required fields
    pub fn new(title: impl Into<String>, source: SourceType) -> Self {
        Self {
            title: title.into(),
            published_year: None,
            url: None,
            thumbnail: None,
            source,
        }
    }

    /// Set publication year
    pub fn published_year(mut self, year: i32) -> Self {
        self.published_year = Some(year);
        self
    }

    /// Set publication year from an optional value
    pub fn maybe_published_year(mut self, year: Option<i32>) -> Self {
        self.published_year = year;
        self
    }

    /// Set the catalog page URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the cover image URL
    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    /// Build the book.
    ///
    /// Fails when the trimmed title is empty. URLs that are not absolute are
    /// dropped rather than rejecting the whole record.
    pub fn build(self) -> Result<Book, ModelError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ModelError::EmptyTitle);
        }

        Ok(Book {
            title: title.to_string(),
            published_year: self.published_year,
            url: self.url.and_then(absolute_url),
            thumbnail: self.thumbnail.and_then(absolute_url),
            source: self.source,
        })
    }
}

fn absolute_url(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match url::Url::parse(trimmed) {
        Ok(parsed) if parsed.has_host() => Some(parsed.to_string()),
        _ => {
            tracing::debug!("Dropping non-absolute URL: {}", trimmed);
            None
        }
    }
}

/// Wire shape used when deserializing, so cached books go through the builder
#[derive(Debug, Deserialize)]
struct BookRecord {
    title: String,
    #[serde(default)]
    published_year: Option<i32>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    source: SourceType,
}

impl TryFrom<BookRecord> for Book {
    type Error = ModelError;

    fn try_from(record: BookRecord) -> Result<Self, Self::Error> {
        let mut builder =
            BookBuilder::new(record.title, record.source).maybe_published_year(record.published_year);
        if let Some(url) = record.url {
            builder = builder.url(url);
        }
        if let Some(thumbnail) = record.thumbnail {
            builder = builder.thumbnail(thumbnail);
        }
        builder.build()
    }
}
