//! Human-readable rendering of search results for the CLI.

use comfy_table::{presets, Attribute, Cell, Table};
use unicode_width::UnicodeWidthChar;

use crate::models::{Book, Page, SearchResult};

const TITLE_COLUMN_WIDTH: usize = 60;

/// Truncate text to a display width, appending "..." when cut.
///
/// Width is measured in terminal columns so wide characters count double.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    if widths.iter().map(|(_, w)| *w).sum::<usize>() <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut truncated = String::new();
    for (c, w) in widths {
        if used + w > budget {
            break;
        }
        used += w;
        truncated.push(c);
    }

    format!("{}...", truncated)
}

fn year_label(book: &Book) -> String {
    book.published_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Numbered plain-text listing.
///
/// `offset` is the number of books on earlier pages so numbering continues
/// across pages.
pub fn format_results(books: &[Book], author: &str, total: usize, offset: usize) -> String {
    let mut output = Vec::new();
    output.push(format!("Found {} books by {}:", total, author));
    output.push("=".repeat(80));

    for (i, book) in books.iter().enumerate() {
        output.push(String::new());
        output.push(format!("{}. {}", offset + i + 1, book.title()));
        output.push(format!("   Published: {}", year_label(book)));
        output.push(format!("   URL: {}", book.url().unwrap_or("-")));
        output.push(format!("   Source: {}", book.source().id()));
    }

    output.join("\n")
}

/// Table with one row per book
pub fn books_table(books: &[Book], offset: usize) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(vec!["#", "Title", "Year", "Source", "URL"]);

    for (i, book) in books.iter().enumerate() {
        table.add_row(vec![
            Cell::new(offset + i + 1),
            Cell::new(truncate_with_ellipsis(book.title(), TITLE_COLUMN_WIDTH))
                .add_attribute(Attribute::Bold),
            Cell::new(year_label(book)),
            Cell::new(book.source().name()),
            Cell::new(book.url().unwrap_or("")),
        ]);
    }

    table
}

/// One line per catalog describing how it fared
pub fn format_source_summary(result: &SearchResult) -> String {
    result
        .sources()
        .iter()
        .map(|(id, report)| match &report.error {
            Some(error) => format!("{}: {:?} ({})", id, report.status, error),
            None => format!("{}: {} books", id, report.count),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Footer describing the page position
pub fn format_page_footer(page: &Page) -> String {
    if page.total_pages == 0 {
        return "No results".to_string();
    }
    let more = if page.has_more {
        format!(" (next: --page {})", page.page + 1)
    } else {
        String::new()
    };
    format!(
        "Page {} of {}, {} books total{}",
        page.page + 1,
        page.total_pages,
        page.total_count,
        more
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookBuilder, SourceType};
    use crate::utils::paginate;

    fn foundation() -> Book {
        BookBuilder::new("Foundation", SourceType::OpenLibrary)
            .published_year(1951)
            .url("https://openlibrary.org/works/OL46125W")
            .build()
            .unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
        assert_eq!(truncate_with_ellipsis("Hello", 0), "");
        // Wide characters take two columns each
        assert_eq!(truncate_with_ellipsis("日本語の本", 7), "日本...");
    }

    #[test]
    fn test_format_results() {
        let nemesis = BookBuilder::new("Nemesis", SourceType::GoogleBooks)
            .build()
            .unwrap();
        let text = format_results(&[foundation(), nemesis], "Isaac Asimov", 2, 0);

        assert!(text.starts_with("Found 2 books by Isaac Asimov:"));
        assert!(text.contains("1. Foundation"));
        assert!(text.contains("   Published: 1951"));
        assert!(text.contains("   URL: https://openlibrary.org/works/OL46125W"));
        assert!(text.contains("2. Nemesis"));
        assert!(text.contains("   Published: Unknown"));
        assert!(text.contains("   Source: google_books"));
    }

    #[test]
    fn test_numbering_continues_across_pages() {
        let text = format_results(&[foundation()], "Isaac Asimov", 51, 50);
        assert!(text.contains("51. Foundation"));
    }

    #[test]
    fn test_page_footer() {
        let books = vec![foundation(); 3];
        assert_eq!(
            format_page_footer(&paginate(&books, 0, 2)),
            "Page 1 of 2, 3 books total (next: --page 1)"
        );
        assert_eq!(
            format_page_footer(&paginate(&books, 1, 2)),
            "Page 2 of 2, 3 books total"
        );
        assert_eq!(format_page_footer(&paginate(&[], 0, 2)), "No results");
    }

    #[test]
    fn test_table_has_row_per_book() {
        let table = books_table(&[foundation(), foundation()], 0);
        assert_eq!(table.row_iter().count(), 2);
    }
}
