//! Page range parsing
//!
//! Turns a human-entered range string like `"1,3,5-10"` into a sorted,
//! deduplicated list of valid 1-based page numbers. Parsing is forgiving:
//! tokens that fail to parse and numbers outside the document are dropped
//! without aborting the rest of the string.

use std::collections::BTreeSet;

/// Parse a page range string into a sorted, deduplicated list of page numbers.
///
/// Tokens are separated by commas; each token is either a single integer or an
/// inclusive range `start-end`. Whitespace around tokens is ignored.
///
/// Filtering rules:
/// - malformed tokens are skipped, never an error
/// - numbers outside `[1, total_pages]` are discarded, not clamped
/// - reversed ranges (`start > end`) contribute nothing; they are not swapped
///
/// An empty result means "nothing to do" and is left to the caller to handle.
///
/// # Examples
///
/// ```
/// use pdf_workbench::range::parse_page_range;
///
/// assert_eq!(parse_page_range("1,3,5-10", 12), vec![1, 3, 5, 6, 7, 8, 9, 10]);
/// assert_eq!(parse_page_range("1,abc,3", 5), vec![1, 3]);
/// assert_eq!(parse_page_range("5-3", 10), Vec::<u32>::new());
/// ```
pub fn parse_page_range(spec: &str, total_pages: u32) -> Vec<u32> {
    let mut pages = BTreeSet::new();

    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = token.split_once('-') {
            let start = start.trim().parse::<u32>();
            let end = end.trim().parse::<u32>();
            if let (Ok(start), Ok(end)) = (start, end) {
                // A reversed range iterates zero times.
                for n in start..=end {
                    if (1..=total_pages).contains(&n) {
                        pages.insert(n);
                    }
                }
            }
        } else if let Ok(n) = token.parse::<u32>() {
            if (1..=total_pages).contains(&n) {
                pages.insert(n);
            }
        }
    }

    pages.into_iter().collect()
}
