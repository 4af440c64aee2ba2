//! Configuration file support for book-finder.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api_keys]
//! google_books = "your-api-key"
//!
//! [sources]
//! enabled_sources = "open_library,google_books"
//! disabled_sources = ""
//!
//! [sources.open_library]
//! base_url = "https://openlibrary.org"
//! page_size = 100
//! max_pages = 100
//! requests_per_second = 5
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//!
//! [search]
//! source_timeout_secs = 30
//! title_normalization = "standard"   # basic | standard | folded
//! page_size = 50
//!
//! [server]
//! host = "0.0.0.0"
//! port = 5000
//!
//! [cache]
//! enabled = true
//! ttl_seconds = 1800
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

const CONFIG_FILE_NAME: &str = "book-finder.toml";
const APP_DIR_NAME: &str = "book-finder";
const ENV_PREFIX: &str = "BOOK_FINDER";

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Look for a configuration file in the default locations.
///
/// Checks `./book-finder.toml` first, then `<config dir>/book-finder/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
        .filter(|path| path.is_file())
}

/// Default directory for cached search results
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".cache").join(APP_DIR_NAME))
}

/// Load configuration: defaults, then the optional file, then environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigFileError> {
    let mut builder =
        config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Write the default configuration as TOML
pub fn write_default_config(path: &Path) -> Result<(), ConfigFileError> {
    let content = toml::to_string_pretty(&Config::default())?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}
