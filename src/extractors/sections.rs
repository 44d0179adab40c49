// src/extractors/sections.rs
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractors::headers::{
    canonical_header, colon_line_after, match_same_line, match_standalone, TopHeaderSet,
};
use crate::utils::text::unify_newlines;

static NON_ALNUM_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Failed to compile NON_ALNUM_RUN_RE"));

/// Extracted body per selected header, in header-set order. Every selected
/// header has an entry; `None` means the header never introduced any text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(String, Option<String>)>,
}

impl SectionMap {
    pub fn get(&self, canonical: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(h, _)| h == canonical)
            .and_then(|(_, body)| body.as_deref())
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(h, body)| (h.as_str(), body.as_deref()))
    }

    /// Bodies in header-set order, absent sections as empty strings.
    pub fn to_row(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, body)| body.as_deref().unwrap_or("")).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output column for a selected header, e.g. `mode of action` -> `addinfo_mode_of_action_seq`.
pub fn section_column_name(canonical: &str) -> String {
    if canonical == "activity" {
        return "Activity_seq".to_string();
    }
    let lowered = canonical.to_lowercase();
    let slug = NON_ALNUM_RUN_RE.replace_all(&lowered, "_");
    format!("addinfo_{}_seq", slug.trim_matches('_'))
}

/// Re-walks `text` and collects the bodies of the headers in `selected`.
///
/// Text following a header outside the set is dropped until the next
/// recognized header, so it never lands in a neighbouring section.
pub fn extract_sections(text: &str, selected: &TopHeaderSet) -> SectionMap {
    let headers = selected.headers();
    let text = unify_newlines(text);
    let lines: Vec<&str> = text.split('\n').collect();
    let mut buffers: Vec<Vec<&str>> = vec![Vec::new(); headers.len()];
    let slot = |raw: &str| {
        let canon = canonical_header(raw);
        headers.iter().position(|h| *h == canon)
    };

    let mut active: Option<usize> = None;
    let mut i = 0;
    while i < lines.len() {
        let s = lines[i].trim();
        if s.is_empty() {
            i += 1;
            continue;
        }

        if let Some((header, rest)) = match_same_line(s) {
            active = slot(header);
            if let Some(k) = active {
                if !rest.is_empty() {
                    buffers[k].push(rest);
                }
            }
            i += 1;
            continue;
        }

        if let Some(header) = match_standalone(s) {
            if let Some(j) = colon_line_after(&lines, i) {
                active = slot(header);
                if let Some(k) = active {
                    let after = lines[j].split_once(':').map_or("", |(_, a)| a.trim());
                    if !after.is_empty() {
                        buffers[k].push(after);
                    }
                }
                i = j + 1;
                continue;
            }
        }

        if let Some(k) = active {
            buffers[k].push(s);
        }
        i += 1;
    }

    let entries = headers
        .iter()
        .zip(buffers)
        .map(|(h, lines)| {
            let body = lines.join("\n").trim().to_string();
            (h.clone(), (!body.is_empty()).then_some(body))
        })
        .collect();

    SectionMap { entries }
}
