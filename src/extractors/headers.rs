// src/extractors/headers.rs
//! Section headers inside "Additional info" text.
//!
//! A header is introduced in one of two ways:
//!
//! * same line: `Mechanism: membrane disruption`
//! * standalone: `Mechanism` alone on a line, with the next non-blank line
//!   starting with a colon (`: membrane disruption`).
//!
//! The two forms are matched by separate functions, same line first.
//! Counting happens over the whole corpus before any section is extracted,
//! and the selected header set is then fixed for every record.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::extractors::sections::section_column_name;
use crate::utils::text::unify_newlines;

// Header shape: a letter, then letters/digits/space/slash/hyphen, optionally a
// `:qualifier` token. Non-greedy so surrounding whitespace stays outside.
static SAME_LINE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9 /-]*?(?::[A-Za-z0-9_-]+)?)\s*:\s*(.*)\s*$")
        .expect("Failed to compile SAME_LINE_HEADER_RE")
});

static STANDALONE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9 /-]*?(?::[A-Za-z0-9_-]+)?)\s*$")
        .expect("Failed to compile STANDALONE_HEADER_RE")
});

static WS_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WS_RUN_RE"));

/// `Header: content` on one line. Returns the raw header and the trimmed remainder.
pub fn match_same_line(line: &str) -> Option<(&str, &str)> {
    let caps = SAME_LINE_HEADER_RE.captures(line)?;
    let header = caps.get(1)?.as_str().trim();
    let rest = caps.get(2).map_or("", |m| m.as_str().trim());
    Some((header, rest))
}

/// A line holding nothing but a header-shaped string.
pub fn match_standalone(line: &str) -> Option<&str> {
    let caps = STANDALONE_HEADER_RE.captures(line)?;
    Some(caps.get(1)?.as_str().trim())
}

/// Index of the first non-blank line after `i`, if it starts with a colon.
pub fn colon_line_after(lines: &[&str], i: usize) -> Option<usize> {
    let j = (i + 1..lines.len()).find(|&j| !lines[j].trim().is_empty())?;
    lines[j].trim_start().starts_with(':').then_some(j)
}

/// Lower-case with internal whitespace collapsed; the sole key for "same section".
pub fn canonical_header(raw: &str) -> String {
    WS_RUN_RE.replace_all(raw.trim(), " ").to_lowercase()
}

/// Raw headers introduced in `text`, one entry per occurrence.
pub fn find_headers(text: &str) -> Vec<String> {
    let text = unify_newlines(text);
    let lines: Vec<&str> = text.split('\n').collect();
    let mut found = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let s = line.trim();
        if s.is_empty() {
            continue;
        }
        if let Some((header, _)) = match_same_line(s) {
            found.push(header.to_string());
            continue;
        }
        if let Some(header) = match_standalone(s) {
            if colon_line_after(&lines, i).is_some() {
                found.push(header.to_string());
            }
        }
    }

    found
}

/// Counts keyed by header string, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderCounts {
    entries: Vec<(String, usize)>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl HeaderCounts {
    pub fn add(&mut self, header: &str, n: usize) {
        match self.index.get(header) {
            Some(&pos) => self.entries[pos].1 += n,
            None => {
                self.index.insert(header.to_string(), self.entries.len());
                self.entries.push((header.to_string(), n));
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, header: &str) -> usize {
        self.index.get(header).map_or(0, |&pos| self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(h, n)| (h.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Raw header occurrences across the corpus.
pub fn count_raw_headers<'a, I>(texts: I) -> HeaderCounts
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = HeaderCounts::default();
    for text in texts {
        if text.trim().is_empty() {
            continue;
        }
        for header in find_headers(text) {
            counts.add(&header, 1);
        }
    }
    counts
}

/// Sums raw counts whose headers share a canonical form.
pub fn canonicalize_counts(raw: &HeaderCounts) -> HeaderCounts {
    let mut canonical = HeaderCounts::default();
    for (header, n) in raw.iter() {
        canonical.add(&canonical_header(header), n);
    }
    canonical
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionConfig {
    pub top_k: usize,
    /// Shorter canonical headers are treated as noise (stray residue letters).
    pub min_header_len: usize,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self { top_k: 5, min_header_len: 3 }
    }
}

/// The corpus-wide selection of section headers, most frequent first.
/// Computed once and then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopHeaderSet(Vec<String>);

impl TopHeaderSet {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: Vec<String> = Vec::new();
        for h in headers {
            let canon = canonical_header(h.as_ref());
            if !set.contains(&canon) {
                set.push(canon);
            }
        }
        Self(set)
    }

    #[cfg(test)]
    pub fn contains(&self, canonical: &str) -> bool {
        self.0.iter().any(|h| h == canonical)
    }

    pub fn headers(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Keeps the `top_k` most frequent canonical headers of at least
/// `min_header_len` characters. Equal counts keep their table order.
///
/// A header whose output column name is already taken by a more frequent
/// one is skipped and the next candidate fills its place.
pub fn select_top_k(canonical: &HeaderCounts, cfg: &SectionConfig) -> TopHeaderSet {
    let mut candidates: Vec<(&str, usize)> = canonical
        .iter()
        .filter(|(h, _)| h.chars().count() >= cfg.min_header_len)
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    let mut columns = HashSet::new();
    let mut selected = Vec::with_capacity(cfg.top_k);
    for (header, _) in candidates {
        if selected.len() == cfg.top_k {
            break;
        }
        if !columns.insert(section_column_name(header)) {
            tracing::debug!("Skipping '{}': column name already used", header);
            continue;
        }
        selected.push(header.to_string());
    }
    TopHeaderSet(selected)
}

/// Full frequency pass over the corpus followed by selection.
pub fn compute_top_k<'a, I>(texts: I, cfg: &SectionConfig) -> (TopHeaderSet, HeaderCounts)
where
    I: IntoIterator<Item = &'a str>,
{
    let raw = count_raw_headers(texts);
    let canonical = canonicalize_counts(&raw);
    tracing::debug!("{} raw headers, {} canonical", raw.len(), canonical.len());
    let top = select_top_k(&canonical, cfg);
    tracing::info!("Top {} section headers: {:?}", top.len(), top.headers());
    (top, canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ignores_case_and_spacing() {
        let variants = ["Mode of Action", "mode  of action", "  MODE of\tAction ", "Mode\u{a0}of action"];
        for v in variants {
            assert_eq!(canonical_header(v), "mode of action", "variant {:?}", v);
        }
    }

    #[test]
    fn same_line_matcher_splits_header_and_rest() {
        assert_eq!(
            match_same_line("History and Discovery: Found in 1987."),
            Some(("History and Discovery", "Found in 1987."))
        );
        assert_eq!(match_same_line("  Target :   membrane  "), Some(("Target", "membrane")));
        assert_eq!(match_same_line("Structure:"), Some(("Structure", "")));
        assert_eq!(match_same_line("MIC: 2 uM: E. coli"), Some(("MIC", "2 uM: E. coli")));
    }

    #[test]
    fn same_line_rejects_prose_and_colon_leads() {
        assert_eq!(match_same_line("Found in 1987. Isolated: frog"), None);
        assert_eq!(match_same_line(": antibacterial"), None);
        assert_eq!(match_same_line("3D structure: NMR"), None);
    }

    #[test]
    fn standalone_matcher_needs_whole_line() {
        assert_eq!(match_standalone("Activity"), Some("Activity"));
        assert_eq!(match_standalone("  Gram-negative/positive  "), Some("Gram-negative/positive"));
        assert_eq!(match_standalone("Activity."), None);
        assert_eq!(match_standalone("Activity: x"), None);
    }

    #[test]
    fn colon_line_skips_blank_lines() {
        let lines = ["Activity", "", "   ", "  : antibacterial"];
        assert_eq!(colon_line_after(&lines, 0), Some(3));
        let lines = ["Activity", "", "antibacterial"];
        assert_eq!(colon_line_after(&lines, 0), None);
        let lines = ["Activity", ""];
        assert_eq!(colon_line_after(&lines, 0), None);
    }

    #[test]
    fn standalone_headers_with_colon_next_line_are_counted() {
        let text = "Activity\n: antibacterial, antifungal\nMechanism\n: membrane disruption";
        let counts = canonicalize_counts(&count_raw_headers([text]));
        assert_eq!(counts.get("activity"), 1);
        assert_eq!(counts.get("mechanism"), 1);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn standalone_without_colon_line_is_content() {
        assert!(find_headers("Isolated from frog skin\nand purified").is_empty());
    }

    #[test]
    fn crlf_text_scans_like_lf() {
        assert_eq!(find_headers("Target: membrane\r\nMechanism\r\n\r\n: pore"), vec!["Target", "Mechanism"]);
    }

    #[test]
    fn raw_variants_sum_into_one_canonical_count() {
        let texts = ["Mechanism: a", "MECHANISM: b\nTarget: c", "mechanism : d"];
        let raw = count_raw_headers(texts);
        assert_eq!(raw.get("Mechanism"), 1);
        assert_eq!(raw.get("MECHANISM"), 1);
        let canonical = canonicalize_counts(&raw);
        assert_eq!(canonical.get("mechanism"), 3);
        assert_eq!(canonical.iter().map(|(h, _)| h).collect::<Vec<_>>(), vec!["mechanism", "target"]);
    }

    #[test]
    fn top_k_filters_short_headers_and_caps_size() {
        let mut counts = HeaderCounts::default();
        for (h, n) in [("k", 50), ("r", 40), ("activity", 10), ("mic", 9), ("target", 8), ("structure", 7),
            ("mechanism", 6), ("source", 5), ("ab", 100)]
        {
            counts.add(h, n);
        }
        let cfg = SectionConfig::default();
        let top = select_top_k(&counts, &cfg);
        assert_eq!(top.headers(), ["activity", "mic", "target", "structure", "mechanism"]);
        assert!(top.headers().iter().all(|h| h.chars().count() >= cfg.min_header_len));

        let top = select_top_k(&counts, &SectionConfig { top_k: 2, min_header_len: 1 });
        assert_eq!(top.headers(), ["ab", "k"]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let texts = ["Target: x\nMechanism: y", "Structure: z\nMechanism: w\nTarget: v"];
        let (top, _) = compute_top_k(texts, &SectionConfig { top_k: 3, min_header_len: 3 });
        assert_eq!(top.headers(), ["target", "mechanism", "structure"]);
    }

    #[test]
    fn headers_sharing_a_column_name_keep_the_first() {
        let texts = ["Mode of action: a\nMode-of-action: b", "Mode of action: a\nMode-of-action: b\nTarget: c"];
        let (top, counts) = compute_top_k(texts, &SectionConfig { top_k: 2, min_header_len: 3 });
        assert_eq!(counts.get("mode-of-action"), 2);
        assert_eq!(top.headers(), ["mode of action", "target"]);

        let columns: Vec<String> = top.headers().iter().map(|h| section_column_name(h)).collect();
        assert_eq!(columns, ["addinfo_mode_of_action_seq", "addinfo_target_seq"]);
    }

    #[test]
    fn top_k_of_empty_corpus_is_empty() {
        let (top, counts) = compute_top_k(["", "  \n "], &SectionConfig::default());
        assert!(top.is_empty());
        assert!(counts.is_empty());
    }

    #[test]
    fn header_set_canonicalizes_and_dedups() {
        let set = TopHeaderSet::new(["Activity", "ACTIVITY", "Mode  of action"]);
        assert_eq!(set.headers(), ["activity", "mode of action"]);
        assert!(set.contains("mode of action"));
    }
}
