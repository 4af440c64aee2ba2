//! Fixed-size pagination over merged results.

use crate::models::{Book, Page};

/// Default number of books per page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Slice `books` into page `page` (zero-based) of `page_size` items.
///
/// A page index past the end yields an empty page with `has_more = false`.
/// A page size of zero is treated as one.
pub fn paginate(books: &[Book], page: usize, page_size: usize) -> Page {
    let page_size = page_size.max(1);
    let total_count = books.len();
    let total_pages = total_count.div_ceil(page_size);

    let start = page.saturating_mul(page_size).min(total_count);
    let end = start.saturating_add(page_size).min(total_count);

    Page {
        page,
        page_size,
        total_count,
        total_pages,
        has_more: end < total_count,
        books: books[start..end].to_vec(),
    }
}
