//! Priority-ordered selector matching, shared by every site module.
//!
//! Each adapter carries a handful of `&[&str]` selector lists (one per
//! field) rather than a single selector per field, because job boards
//! reshuffle their markup often enough that a single hard-coded selector
//! is the most common source of [`crate::error::AdapterError::Drift`].
//! The first selector in the list that matches anything wins; later
//! selectors are only tried when earlier ones find nothing.

use scraper::{ElementRef, Html, Selector};

/// Try each selector in `candidates` against `root` in order; return the
/// elements matched by the first selector that matches at least one
/// element. Invalid selector strings are skipped rather than panicking.
pub fn first_non_empty_match<'a>(root: &'a Html, candidates: &[&str]) -> Vec<ElementRef<'a>> {
    for raw in candidates {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let matches: Vec<ElementRef<'a>> = root.select(&selector).collect();
        if !matches.is_empty() {
            return matches;
        }
    }
    Vec::new()
}

/// Same as [`first_non_empty_match`] but scoped to a single element
/// (used when extracting a field from inside one already-located card).
pub fn first_text_match(root: &ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    for raw in candidates {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(found) = root.select(&selector).next() {
            let text = found.text().collect::<Vec<_>>().join(" ");
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(collapse_whitespace(trimmed));
            }
        }
    }
    None
}

/// The first `href` found on an anchor matching `candidates` (defaults to
/// `a` if none given), scoped to a single card element.
pub fn first_href(root: &ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    let fallback = ["a"];
    let list = if candidates.is_empty() { &fallback[..] } else { candidates };
    for raw in list {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(anchor) = root.select(&selector).next() {
            if let Some(href) = anchor.value().attr("href") {
                if !href.trim().is_empty() {
                    return Some(href.trim().to_string());
                }
            }
        }
    }
    None
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `Html::parse_fragment` wraps its input in a synthetic
/// `<html><body>...</body></html>`; this recovers the element the
/// fragment actually represents (the first child of `<body>`).
pub fn fragment_root(fragment: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("body > *").ok()?;
    fragment.select(&selector).next()
}
