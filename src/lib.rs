//! # Book Finder
//!
//! Finds every book by an author across several public book catalogs,
//! merges the results into one deduplicated list ordered newest first, and
//! serves it over a small JSON API or the command line.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Book, SearchResult, Page, etc.)
//! - [`sources`]: Catalog plugins behind the [`Source`] trait
//! - [`search`]: The [`BookFinder`] orchestrator
//! - [`server`]: HTTP API
//! - [`utils`]: HTTP client, retry, deduplication, pagination and other utilities
//! - [`config`]: Configuration management

pub mod config;
pub mod models;
pub mod search;
pub mod server;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{Book, SearchResult};
pub use search::{BookFinder, SearchError};
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
