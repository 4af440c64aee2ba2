//! Utility modules supporting book searches.
//!
//! - [`merge_books`]: Merge per-catalog results into one deduplicated, ranked list
//! - [`normalize_title`] / [`TitleNormalization`]: Dedup key computation
//! - [`paginate`]: Slice merged results into fixed-size pages
//! - [`HttpClient`]: Shared HTTP client with one connection pool
//! - [`RequestPacer`]: Per-catalog request pacing
//! - [`RetryConfig`] / [`with_retry`]: Bounded retry with exponential backoff
//! - [`CacheService`]: Optional TTL'd file cache of merged results
//! - [`validate_author`]: Author name validation
//!
//! # Merging
//!
//! ```rust
//! use book_finder::models::{BookBuilder, SourceType};
//! use book_finder::utils::{merge_books, TitleNormalization};
//!
//! let open_library = vec![BookBuilder::new("Foundation", SourceType::OpenLibrary)
//!     .published_year(1951)
//!     .build()
//!     .unwrap()];
//! let google_books = vec![BookBuilder::new("FOUNDATION", SourceType::GoogleBooks)
//!     .build()
//!     .unwrap()];
//!
//! let merged = merge_books(vec![open_library, google_books], TitleNormalization::Standard);
//! assert_eq!(merged.len(), 1);
//! ```
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use book_finder::utils::{with_retry, RetryConfig};
//! use book_finder::sources::SourceError;
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let config = RetryConfig::default().max_attempts(3);
//! let result = with_retry(config, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod dedup;
mod format;
mod http;
mod paginate;
mod rate_limit;
mod retry;
mod validate;

pub use cache::{CacheResult, CacheService, SearchKey};
pub use dedup::{compare_years, find_duplicates, merge_books, normalize_title, TitleNormalization};
pub use format::{
    books_table, format_page_footer, format_results, format_source_summary, truncate_with_ellipsis,
};
pub use http::HttpClient;
pub use paginate::{paginate, DEFAULT_PAGE_SIZE};
pub use rate_limit::RequestPacer;
pub use retry::{with_retry, RetryConfig, TransientError};
pub use validate::{validate_author, AuthorBounds, ValidationError};
