//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `BOOK_FINDER_*` environment variables (nested keys separated by `__`,
//! e.g. `BOOK_FINDER_SEARCH__PAGE_SIZE=25`).

mod file_config;

pub use file_config::{
    default_cache_dir, find_config_file, load_config, write_default_config, ConfigFileError,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::SourceType;
use crate::utils::{RetryConfig, TitleNormalization, DEFAULT_PAGE_SIZE};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys for catalogs that accept them
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Which catalogs are used and how they are queried
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Retry policy applied to every catalog request
    #[serde(default)]
    pub retry: RetrySettings,

    /// Search orchestration settings
    #[serde(default)]
    pub search: SearchSettings,

    /// Outbound HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Environment variable consulted when no Google Books key is configured
pub const GOOGLE_BOOKS_API_KEY_ENV: &str = "GOOGLE_BOOKS_API_KEY";

/// API keys for external services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Google Books API key (optional, raises the anonymous quota)
    #[serde(default)]
    pub google_books: Option<String>,
}

impl ApiKeys {
    /// The configured Google Books key, else `GOOGLE_BOOKS_API_KEY`
    pub fn resolve_google_books(&self) -> Option<String> {
        self.google_books
            .clone()
            .or_else(|| std::env::var(GOOGLE_BOOKS_API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }

    fn redacted(&self) -> Self {
        Self {
            google_books: self.google_books.as_ref().map(|_| "********".to_string()),
        }
    }
}

impl Config {
    /// Copy of the configuration safe to print, with API keys masked
    pub fn redacted(&self) -> Self {
        Self {
            api_keys: self.api_keys.redacted(),
            ..self.clone()
        }
    }
}

/// Catalog selection and per-catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Only use these catalogs (comma-separated ids)
    #[serde(default)]
    pub enabled_sources: Option<String>,

    /// Never use these catalogs (comma-separated ids)
    #[serde(default)]
    pub disabled_sources: Option<String>,

    #[serde(default = "default_open_library")]
    pub open_library: CatalogSettings,

    #[serde(default = "default_google_books")]
    pub google_books: CatalogSettings,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled_sources: None,
            disabled_sources: None,
            open_library: default_open_library(),
            google_books: default_google_books(),
        }
    }
}

impl SourcesConfig {
    /// Whether a catalog should be queried.
    ///
    /// `disabled_sources` always wins; when `enabled_sources` is set only the
    /// listed catalogs are used.
    pub fn is_enabled(&self, source: SourceType) -> bool {
        if id_list_contains(self.disabled_sources.as_deref(), source) {
            return false;
        }
        match self.enabled_sources.as_deref() {
            Some(list) if !list.trim().is_empty() => id_list_contains(Some(list), source),
            _ => true,
        }
    }

    /// Settings for one catalog
    pub fn catalog(&self, source: SourceType) -> &CatalogSettings {
        match source {
            SourceType::OpenLibrary => &self.open_library,
            SourceType::GoogleBooks => &self.google_books,
        }
    }
}

fn id_list_contains(list: Option<&str>, source: SourceType) -> bool {
    list.map(|l| {
        l.split(',')
            .filter_map(SourceType::from_id)
            .any(|s| s == source)
    })
    .unwrap_or(false)
}

/// How one catalog is queried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// API base URL (overridable for mirrors and tests)
    pub base_url: String,

    /// Records requested per upstream page
    pub page_size: usize,

    /// Upper bound on upstream pages fetched for one author
    pub max_pages: usize,

    /// Request pacing for this catalog
    pub requests_per_second: u32,
}

fn default_open_library() -> CatalogSettings {
    CatalogSettings {
        base_url: "https://openlibrary.org".to_string(),
        page_size: 100,
        max_pages: 100,
        requests_per_second: 5,
    }
}

fn default_google_books() -> CatalogSettings {
    CatalogSettings {
        base_url: "https://www.googleapis.com/books/v1".to_string(),
        page_size: 40,
        max_pages: 100,
        requests_per_second: 5,
    }
}

/// Retry policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_max_total_time_secs")]
    pub max_total_time_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_total_time_secs: default_max_total_time_secs(),
        }
    }
}

impl RetrySettings {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            max_total_time: Duration::from_secs(self.max_total_time_secs),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_total_time_secs() -> u64 {
    20
}

/// Search orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Shortest accepted author name after trimming
    #[serde(default = "default_min_author_len")]
    pub min_author_len: usize,

    /// Longest accepted author name after trimming
    #[serde(default = "default_max_author_len")]
    pub max_author_len: usize,

    /// Time allowed for one catalog (all of its pages and retries)
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,

    /// Dedup key normalization
    #[serde(default)]
    pub title_normalization: TitleNormalization,

    /// Default page size for paginated output
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Largest page size a caller may request
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_author_len: default_min_author_len(),
            max_author_len: default_max_author_len(),
            source_timeout_secs: default_source_timeout_secs(),
            title_normalization: TitleNormalization::default(),
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl SearchSettings {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

fn default_min_author_len() -> usize {
    2
}

fn default_max_author_len() -> usize {
    200
}

fn default_source_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> usize {
    200
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000)
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: None,
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_ttl() -> u64 {
    1800 // 30 minutes
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "json" for structured output, anything else for human-readable
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
