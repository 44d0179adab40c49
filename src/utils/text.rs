// src/utils/text.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

static HORIZONTAL_WS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\r\x0B\x0C]+").expect("Failed to compile HORIZONTAL_WS_RE"));

static EXCESS_NEWLINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Failed to compile EXCESS_NEWLINES_RE"));

/// Collapses horizontal whitespace to single spaces, caps blank runs at one
/// empty line and trims. NBSP counts as a space.
pub fn normalize_ws(s: &str) -> String {
    let s = s.replace('\u{a0}', " ");
    let s = HORIZONTAL_WS_RE.replace_all(&s, " ");
    let s = EXCESS_NEWLINES_RE.replace_all(&s, "\n\n");
    s.trim().to_string()
}

/// Text of an element with every text node trimmed, empty nodes dropped and
/// the rest joined by `sep`.
pub fn joined_text(element: ElementRef, sep: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Unifies CRLF and lone CR line endings to LF.
pub fn unify_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}
