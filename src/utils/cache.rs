//! Local caching for merged search results.
//!
//! Results are stored as JSON files, one per search, named by an md5 digest
//! of the lowercased author, the queried catalogs and the dedup mode.
//!
//! # Cache Structure
//!
//! ```text
//! ~/.cache/book-finder/
//!   searches/
//!     <hash>
//! ```

use crate::config::CacheConfig;
use crate::models::SearchResult;
use crate::utils::TitleNormalization;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Cache metadata stored with each cached item
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheMetadata {
    /// When the item was cached (Unix timestamp)
    cached_at: u64,

    /// When the item expires (Unix timestamp)
    expires_at: u64,

    /// Author that was searched
    author: String,
}

/// Wrapper for a cached search result
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedSearchResult {
    metadata: CacheMetadata,
    result: SearchResult,
}

/// Result of a cache lookup
#[derive(Debug)]
pub enum CacheResult<T> {
    /// Item was found and is valid
    Hit(T),

    /// Item was not found
    Miss,

    /// Item was found but has expired
    Expired,
}

/// Identifies one cacheable search
#[derive(Debug, Clone, Copy)]
pub struct SearchKey<'a> {
    pub author: &'a str,
    pub sources: &'a [&'a str],
    pub normalization: TitleNormalization,
}

impl SearchKey<'_> {
    fn digest(&self) -> String {
        let input = format!(
            "{}|{}|{}",
            self.author.to_lowercase(),
            self.sources.join(","),
            self.normalization.as_str()
        );
        format!("{:x}", md5::compute(input.as_bytes()))
    }
}

/// Cache service for storing and retrieving search results
#[derive(Debug, Clone)]
pub struct CacheService {
    /// Base cache directory
    base_dir: PathBuf,

    /// Search cache directory
    search_dir: PathBuf,

    config: CacheConfig,
}

impl CacheService {
    /// Create a new cache service with the given config
    pub fn from_config(config: CacheConfig) -> Self {
        let base_dir = config
            .directory
            .clone()
            .unwrap_or_else(crate::config::default_cache_dir);
        let search_dir = base_dir.join("searches");

        Self {
            base_dir,
            search_dir,
            config,
        }
    }

    /// Initialize the cache directories
    pub fn initialize(&self) -> std::io::Result<()> {
        if self.config.enabled {
            fs::create_dir_all(&self.search_dir)?;
            tracing::info!("Cache initialized at: {}", self.base_dir.display());
        } else {
            tracing::debug!("Cache is disabled");
        }
        Ok(())
    }

    /// Check if caching is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Get the cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.base_dir
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Read a cached search result
    pub fn get_search(&self, key: &SearchKey<'_>) -> CacheResult<SearchResult> {
        if !self.is_enabled() {
            return CacheResult::Miss;
        }

        let digest = key.digest();
        let cache_path = self.search_dir.join(&digest);

        match self.read_cache_file::<CachedSearchResult>(&cache_path) {
            Ok(cached) => {
                if Self::now() >= cached.metadata.expires_at {
                    tracing::debug!("Cache expired for search: {}", digest);
                    CacheResult::Expired
                } else {
                    tracing::debug!("Cache HIT for search: {}", digest);
                    CacheResult::Hit(cached.result)
                }
            }
            Err(_) => {
                tracing::debug!("Cache MISS for search: {}", digest);
                CacheResult::Miss
            }
        }
    }

    /// Cache a search result
    pub fn set_search(&self, key: &SearchKey<'_>, result: &SearchResult) {
        if !self.is_enabled() {
            return;
        }

        let digest = key.digest();
        let cache_path = self.search_dir.join(&digest);
        let now = Self::now();

        let cached = CachedSearchResult {
            metadata: CacheMetadata {
                cached_at: now,
                expires_at: now + self.config.ttl_seconds,
                author: key.author.to_string(),
            },
            result: result.clone(),
        };

        if let Err(e) = self.write_cache_file(&cache_path, &cached) {
            tracing::warn!("Failed to cache search result: {}", e);
        } else {
            tracing::debug!("Cached search result: {}", digest);
        }
    }

    fn read_cache_file<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> std::io::Result<T> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    fn write_cache_file<T: Serialize>(&self, path: &Path, data: &T) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(data)?;
        fs::write(path, content)
    }

    /// Clear all cached data
    pub fn clear_all(&self) -> std::io::Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let _ = fs::remove_dir_all(&self.base_dir);
        self.initialize()?;
        tracing::info!("Cache cleared");
        Ok(())
    }

    /// Number of cached searches
    pub fn entry_count(&self) -> usize {
        self.search_dir.read_dir().map(|e| e.count()).unwrap_or(0)
    }

    /// Time-to-live for new entries
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_seconds)
    }
}
