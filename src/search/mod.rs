//! Search orchestration across every registered catalog.
//!
//! [`BookFinder`] validates the author once, consults the optional result
//! cache, queries every catalog concurrently (each bounded by its own
//! timeout) and merges what came back into one deduplicated, ranked
//! [`SearchResult`]. Catalog failures never fail a search; they show up in
//! the result's per-source reports instead.

use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;

use crate::config::{Config, SearchSettings};
use crate::models::{SearchResult, SourceFetch, SourceReport};
use crate::sources::SourceRegistry;
use crate::utils::{
    merge_books, validate_author, AuthorBounds, CacheResult, CacheService, HttpClient, SearchKey,
    ValidationError,
};

/// Errors surfaced to callers of a search
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
}

/// Finds every book by an author across the registered catalogs
#[derive(Debug, Clone)]
pub struct BookFinder {
    registry: SourceRegistry,
    settings: SearchSettings,
    cache: Option<CacheService>,
}

impl BookFinder {
    /// Create a finder over `registry` without a cache
    pub fn new(registry: SourceRegistry, settings: SearchSettings) -> Self {
        Self {
            registry,
            settings,
            cache: None,
        }
    }

    /// Build a finder, its catalogs and (if enabled) its cache from configuration
    pub fn from_config(config: &Config) -> Self {
        let http = HttpClient::from_settings(&config.http);
        let finder = Self::new(
            SourceRegistry::from_config(config, http),
            config.search.clone(),
        );

        if !config.cache.enabled {
            return finder;
        }

        let cache = CacheService::from_config(config.cache.clone());
        match cache.initialize() {
            Ok(()) => finder.with_cache(cache),
            Err(e) => {
                tracing::warn!("Cache unavailable, continuing without it: {}", e);
                finder
            }
        }
    }

    /// Use `cache` for search results
    pub fn with_cache(mut self, cache: CacheService) -> Self {
        self.cache = cache.is_enabled().then_some(cache);
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Validate and normalize an author name with this finder's bounds
    pub fn validate(&self, author_name: &str) -> Result<String, SearchError> {
        let bounds = AuthorBounds {
            min_len: self.settings.min_author_len,
            max_len: self.settings.max_author_len,
        };
        Ok(validate_author(author_name, bounds)?)
    }

    /// Find every book by `author_name`, deduplicated and newest first.
    ///
    /// Fails only when the author name is invalid. Catalogs that fail or time
    /// out contribute no books; if all of them fail the result is empty.
    pub async fn search_books_by_author(
        &self,
        author_name: &str,
    ) -> Result<SearchResult, SearchError> {
        let author = self.validate(author_name)?;
        let source_ids: Vec<&str> = self.registry.ids().collect();
        let key = SearchKey {
            author: &author,
            sources: &source_ids,
            normalization: self.settings.title_normalization,
        };

        if let Some(cache) = &self.cache {
            if let CacheResult::Hit(result) = cache.get_search(&key) {
                tracing::info!(author = %author, books = result.len(), "Serving cached search");
                return Ok(result);
            }
        }

        let started = Instant::now();
        let source_timeout = self.settings.source_timeout();

        let fetches = self.registry.all().map(|source| {
            let author = author.as_str();
            async move {
                match tokio::time::timeout(source_timeout, source.fetch_with_report(author)).await
                {
                    Ok(fetch) => fetch,
                    Err(_) => {
                        tracing::warn!(
                            source = source.id(),
                            "Source timed out after {:?}",
                            source_timeout
                        );
                        SourceFetch {
                            source: source.source_type(),
                            books: Vec::new(),
                            report: SourceReport::timeout(source_timeout),
                        }
                    }
                }
            }
        });
        let fetches = join_all(fetches).await;

        let mut reports = BTreeMap::new();
        let mut gathered = Vec::with_capacity(fetches.len());
        for fetch in fetches {
            tracing::debug!(
                source = fetch.source.id(),
                status = ?fetch.report.status,
                books = fetch.books.len(),
                "Source finished"
            );
            reports.insert(fetch.source.id().to_string(), fetch.report);
            gathered.push(fetch.books);
        }

        let books = merge_books(gathered, self.settings.title_normalization);
        let result = SearchResult::new(author.clone(), books, reports);

        if result.all_sources_failed() {
            tracing::warn!(author = %author, "Every source failed");
        }
        tracing::info!(
            author = %author,
            books = result.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search complete"
        );

        if let Some(cache) = &self.cache {
            if result.sources().values().any(SourceReport::is_success) {
                cache.set_search(&key, &result);
            }
        }

        Ok(result)
    }
}
