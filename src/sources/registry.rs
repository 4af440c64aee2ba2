//! Registry for managing catalog source plugins.

use std::sync::Arc;

use super::{GoogleBooksSource, OpenLibrarySource, Source};
use crate::config::Config;
use crate::models::SourceType;
use crate::utils::HttpClient;

/// Registry of the catalogs a search fans out to
///
/// Sources are kept in registration order, which is the order their
/// results are merged in.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create a registry with every catalog, using default settings
    pub fn new() -> Self {
        Self::from_config(&Config::default(), HttpClient::new())
    }

    /// Create a registry with no catalogs
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Create a registry with the catalogs enabled in `config`
    ///
    /// All catalogs share `http`, so they use one connection pool.
    pub fn from_config(config: &Config, http: HttpClient) -> Self {
        let mut registry = Self::empty();
        let retry = config.retry.retry_config();

        for source_type in SourceType::ALL {
            if !config.sources.is_enabled(source_type) {
                tracing::info!("Source disabled: {}", source_type.id());
                continue;
            }

            let settings = config.sources.catalog(source_type).clone();
            let source: Arc<dyn Source> = match source_type {
                SourceType::OpenLibrary => {
                    Arc::new(OpenLibrarySource::new(http.clone(), settings, retry))
                }
                SourceType::GoogleBooks => Arc::new(GoogleBooksSource::new(
                    http.clone(),
                    settings,
                    retry,
                    config.api_keys.resolve_google_books(),
                )),
            };
            registry.register(source);
        }

        if registry.is_empty() {
            tracing::warn!("No sources enabled; searches will return no books");
        }

        registry
    }

    /// Register a source, replacing any source with the same ID in place
    pub fn register(&mut self, source: Arc<dyn Source>) {
        match self.sources.iter().position(|s| s.id() == source.id()) {
            Some(index) => self.sources[index] = source,
            None => self.sources.push(source),
        }
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// Get all registered sources in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get all source IDs in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    /// Check if a source exists
    pub fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
