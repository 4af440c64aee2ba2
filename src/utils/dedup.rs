//! Deduplication and ranking of books gathered from several catalogs.
//!
//! Two records describe the same work when their normalized titles match,
//! whatever their source or year. The normalization is configurable through
//! [`TitleNormalization`]:
//!
//! | mode       | case | whitespace | punctuation | diacritics |
//! |------------|------|------------|-------------|------------|
//! | `basic`    | folded | collapsed | kept       | kept       |
//! | `standard` | folded | collapsed | ignored    | kept       |
//! | `folded`   | folded | collapsed | ignored    | stripped   |
//!
//! In `standard` and `folded` modes apostrophes are deleted ("Ender's" and
//! "Enders" match) and every other non-alphanumeric character counts as a
//! word break ("I, Robot" and "I Robot" match).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Book;

/// How titles are normalized into dedup keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleNormalization {
    /// Case-insensitive, whitespace-collapsed
    Basic,
    /// `Basic` plus punctuation-insensitive
    #[default]
    Standard,
    /// `Standard` plus accents and compatibility forms folded
    Folded,
}

impl TitleNormalization {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleNormalization::Basic => "basic",
            TitleNormalization::Standard => "standard",
            TitleNormalization::Folded => "folded",
        }
    }
}

impl std::str::FromStr for TitleNormalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(TitleNormalization::Basic),
            "standard" => Ok(TitleNormalization::Standard),
            "folded" => Ok(TitleNormalization::Folded),
            other => Err(format!("unknown title normalization: {}", other)),
        }
    }
}

/// Compute the dedup key for a title
pub fn normalize_title(title: &str, mode: TitleNormalization) -> String {
    let basic = collapse_whitespace(&title.to_lowercase());

    let key = match mode {
        TitleNormalization::Basic => return basic,
        TitleNormalization::Standard => strip_punctuation(&basic),
        TitleNormalization::Folded => {
            let folded: String = basic.nfkd().filter(|c| !is_combining_mark(*c)).collect();
            strip_punctuation(&folded.to_lowercase())
        }
    };

    // Titles made only of punctuation keep their literal form so they never
    // collapse onto each other
    if key.is_empty() {
        basic
    } else {
        key
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_punctuation(text: &str) -> String {
    let spaced: String = text
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '`'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_whitespace(&spaced)
}

/// Group book indices by dedup key.
///
/// Groups come back in order of first appearance and indices inside a group
/// are ascending.
fn group_by_title(books: &[Book], mode: TitleNormalization) -> Vec<Vec<usize>> {
    let mut key_to_group: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (idx, book) in books.iter().enumerate() {
        let key = normalize_title(book.title(), mode);
        match key_to_group.get(&key) {
            Some(&group) => groups[group].push(idx),
            None => {
                key_to_group.insert(key, groups.len());
                groups.push(vec![idx]);
            }
        }
    }

    groups
}

/// Find books that share a dedup key
///
/// Returns groups of indices (only groups with more than one member)
pub fn find_duplicates(books: &[Book], mode: TitleNormalization) -> Vec<Vec<usize>> {
    group_by_title(books, mode)
        .into_iter()
        .filter(|group| group.len() > 1)
        .collect()
}

/// Order years newest first with unknown years last
pub fn compare_years(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Merge per-catalog results into one deduplicated, ranked list.
///
/// `sources` is consumed in order; that order (then each catalog's own order)
/// defines arrival order. For every group of same-titled books the earliest
/// arrival that has a year is kept, or the earliest arrival when none has a
/// year. The output is sorted by year descending, unknown years last, and
/// ties keep the order in which each work was first seen.
pub fn merge_books(sources: Vec<Vec<Book>>, mode: TitleNormalization) -> Vec<Book> {
    let arrived: Vec<Book> = sources.into_iter().flatten().collect();
    let total = arrived.len();
    let groups = group_by_title(&arrived, mode);

    // (first seen, representative)
    let mut picks: Vec<(usize, usize)> = groups
        .iter()
        .map(|group| {
            let representative = group
                .iter()
                .copied()
                .find(|&idx| arrived[idx].published_year().is_some())
                .unwrap_or(group[0]);
            (group[0], representative)
        })
        .collect();

    picks.sort_by(|a, b| {
        compare_years(
            arrived[a.1].published_year(),
            arrived[b.1].published_year(),
        )
        .then(a.0.cmp(&b.0))
    });

    let mut slots: Vec<Option<Book>> = arrived.into_iter().map(Some).collect();
    let merged: Vec<Book> = picks
        .into_iter()
        .filter_map(|(_, representative)| slots[representative].take())
        .collect();

    tracing::debug!(
        "Deduplication: {} -> {} books ({} duplicates removed)",
        total,
        merged.len(),
        total - merged.len()
    );

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookBuilder, SourceType};
    use std::collections::HashSet;

    fn book(title: &str, year: Option<i32>, source: SourceType) -> Book {
        BookBuilder::new(title, source)
            .maybe_published_year(year)
            .build()
            .unwrap()
    }

    fn ol(title: &str, year: Option<i32>) -> Book {
        book(title, year, SourceType::OpenLibrary)
    }

    fn gb(title: &str, year: Option<i32>) -> Book {
        book(title, year, SourceType::GoogleBooks)
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title()).collect()
    }

    #[test]
    fn test_normalize_modes() {
        let title = "  Ender's   GAME: a Novel ";
        assert_eq!(
            normalize_title(title, TitleNormalization::Basic),
            "ender's game: a novel"
        );
        assert_eq!(
            normalize_title(title, TitleNormalization::Standard),
            "enders game a novel"
        );
        assert_eq!(
            normalize_title("Les Misérables", TitleNormalization::Standard),
            "les misérables"
        );
        assert_eq!(
            normalize_title("Les Misérables", TitleNormalization::Folded),
            "les miserables"
        );
    }

    #[test]
    fn test_punctuation_only_title_keeps_literal_key() {
        assert_eq!(normalize_title("?!", TitleNormalization::Standard), "?!");
        assert_ne!(
            normalize_title("?!", TitleNormalization::Standard),
            normalize_title("...", TitleNormalization::Standard)
        );
    }

    #[test]
    fn test_foundation_from_both_sources() {
        let merged = merge_books(
            vec![
                vec![ol("Foundation", Some(1951))],
                vec![gb("Foundation", Some(1951))],
            ],
            TitleNormalization::Standard,
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title(), "Foundation");
        assert_eq!(merged[0].source(), SourceType::OpenLibrary);
    }

    #[test]
    fn test_prefers_record_with_year() {
        let merged = merge_books(
            vec![vec![ol("I, Robot", None)], vec![gb("I Robot", Some(1950))]],
            TitleNormalization::Standard,
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].published_year(), Some(1950));
        assert_eq!(merged[0].source(), SourceType::GoogleBooks);
    }

    #[test]
    fn test_prefers_earliest_source_when_both_have_years() {
        let merged = merge_books(
            vec![
                vec![ol("The Gods Themselves", Some(1972))],
                vec![gb("The Gods Themselves", Some(1990))],
            ],
            TitleNormalization::Standard,
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].published_year(), Some(1972));
        assert_eq!(merged[0].source(), SourceType::OpenLibrary);
    }

    #[test]
    fn test_keeps_earliest_when_no_year() {
        let merged = merge_books(
            vec![vec![ol("Nightfall", None)], vec![gb("NIGHTFALL", None)]],
            TitleNormalization::Standard,
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title(), "Nightfall");
    }

    #[test]
    fn test_sorted_by_year_desc_missing_last() {
        let merged = merge_books(
            vec![
                vec![ol("Pebble in the Sky", Some(1950)), ol("Opus 100", None)],
                vec![gb("Foundation's Edge", Some(1982)), gb("The Caves of Steel", Some(1954))],
            ],
            TitleNormalization::Standard,
        );

        assert_eq!(
            titles(&merged),
            vec![
                "Foundation's Edge",
                "The Caves of Steel",
                "Pebble in the Sky",
                "Opus 100"
            ]
        );
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let merged = merge_books(
            vec![
                vec![ol("B", Some(1951)), ol("Untitled Z", None)],
                vec![gb("A", Some(1951)), gb("Untitled Y", None)],
            ],
            TitleNormalization::Standard,
        );

        assert_eq!(titles(&merged), vec!["B", "A", "Untitled Z", "Untitled Y"]);
    }

    #[test]
    fn test_tie_uses_group_first_seen_position() {
        // "A" first arrives without a year; its representative comes later
        // but the work still ranks by where it was first seen.
        let merged = merge_books(
            vec![
                vec![ol("A", None), ol("B", Some(2000))],
                vec![gb("a", Some(2000))],
            ],
            TitleNormalization::Standard,
        );

        assert_eq!(titles(&merged), vec!["a", "B"]);
    }

    #[test]
    fn test_same_source_duplicates_merged() {
        let merged = merge_books(
            vec![vec![ol("Foundation", Some(1951)), ol("foundation", Some(1966))]],
            TitleNormalization::Standard,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].published_year(), Some(1951));
    }

    #[test]
    fn test_basic_mode_keeps_punctuation_variants_apart() {
        let sources = vec![vec![ol("I, Robot", Some(1950))], vec![gb("I Robot", Some(1950))]];
        assert_eq!(merge_books(sources.clone(), TitleNormalization::Basic).len(), 2);
        assert_eq!(merge_books(sources, TitleNormalization::Standard).len(), 1);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_books(Vec::new(), TitleNormalization::Standard).is_empty());
        assert!(merge_books(vec![Vec::new(), Vec::new()], TitleNormalization::Standard).is_empty());
    }

    #[test]
    fn test_find_duplicates() {
        let books = vec![
            ol("Foundation", Some(1951)),
            ol("Robots of Dawn", Some(1983)),
            gb("FOUNDATION", None),
        ];
        let groups = find_duplicates(&books, TitleNormalization::Standard);
        assert_eq!(groups, vec![vec![0, 2]]);
    }

    #[test]
    fn test_invariants_hold_for_mixed_input() {
        let words = ["Foundation", "foundation!", "Robot", "Dawn", "Empire", "empire"];
        let mut ol_books = Vec::new();
        let mut gb_books = Vec::new();
        for i in 0..60usize {
            let title = format!("{} {}", words[i % words.len()], i % 7);
            let year = if i % 5 == 0 { None } else { Some(1940 + (i * 13 % 50) as i32) };
            if i % 2 == 0 {
                ol_books.push(ol(&title, year));
            } else {
                gb_books.push(gb(&title, year));
            }
        }
        let input_len = ol_books.len() + gb_books.len();

        let merged = merge_books(vec![ol_books.clone(), gb_books.clone()], TitleNormalization::Standard);

        assert!(merged.len() <= input_len);

        let keys: HashSet<String> = merged
            .iter()
            .map(|b| normalize_title(b.title(), TitleNormalization::Standard))
            .collect();
        assert_eq!(keys.len(), merged.len());

        for pair in merged.windows(2) {
            match (pair[0].published_year(), pair[1].published_year()) {
                (Some(a), Some(b)) => assert!(a >= b),
                (None, Some(_)) => panic!("book without year sorted before dated book"),
                _ => {}
            }
        }

        let again = merge_books(vec![ol_books, gb_books], TitleNormalization::Standard);
        assert_eq!(merged, again);
    }
}
