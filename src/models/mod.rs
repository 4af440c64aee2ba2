//! Core data models for books and search results.

mod book;
mod search;

pub use book::{Book, BookBuilder, ModelError, SourceType};
pub use search::{Page, SearchResult, SourceFetch, SourceReport, SourceStatus};
