// src/utils/html_debug.rs
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::utils::error::StorageError;

/// Markup the crawler and record parser depend on. A page that failed to parse
/// is annotated with these so a template change is easy to spot.
pub const PAGE_MARKERS: &[(&str, &str)] = &[
    (r#"(?i)<form[^>]*action=["'][^"']*result[^"']*["'][^>]*>"#, "form"),
    (r#"(?i)<input[^>]*name=["']ID["'][^>]*>"#, "id"),
    (r#"(?i)<table[^>]*class=["'][^"']*peptide[^"']*["'][^>]*>"#, "table"),
    (r#"(?i)<p[^>]*class=["'][^"']*peptide_sequence[^"']*["'][^>]*>"#, "sequence"),
    (r"(?i)additional\s+info", "label"),
    (r"(?i)<b>[^<]*</b>", "label"),
];

/// Writes `html` with the given byte ranges wrapped in highlight spans.
pub fn save_debug_html(
    html: &str,
    path: &Path,
    highlights: &[(usize, usize, &str)],
) -> Result<(), StorageError> {
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    debug_html.push_str(".highlight-form { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-id { background-color: #FFA500; }\n");
    debug_html.push_str(".highlight-table { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-sequence { background-color: #ADD8E6; }\n");
    debug_html.push_str(".highlight-label { background-color: #FFC0CB; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    let mut sorted = highlights.to_vec();
    sorted.sort_by_key(|h| h.0);

    let mut last_pos = 0;
    for (start, end, kind) in sorted {
        // Overlapping matches would split a span; first one wins.
        if start < last_pos {
            continue;
        }
        debug_html.push_str(&html[last_pos..start]);
        debug_html.push_str(&format!(
            "<span class=\"highlight-{}\" title=\"{}-{} {}\">",
            kind, start, end, kind
        ));
        debug_html.push_str(&html[start..end]);
        debug_html.push_str("</span>");
        last_pos = end;
    }
    debug_html.push_str(&html[last_pos..]);
    debug_html.push_str("\n</body>\n</html>");

    fs::write(path, debug_html)?;
    tracing::debug!("Saved annotated HTML to {}", path.display());
    Ok(())
}

/// Annotates every match of `patterns` and saves the result to `path`.
pub fn create_debug_html(html: &str, path: &Path, patterns: &[(&str, &str)]) -> Result<(), StorageError> {
    let mut highlights = Vec::new();
    for (pattern, kind) in patterns {
        let re = Regex::new(pattern).map_err(|e| {
            StorageError::SerializationError(format!("Invalid regex pattern '{}': {}", pattern, e))
        })?;
        for mat in re.find_iter(html) {
            highlights.push((mat.start(), mat.end(), *kind));
        }
    }
    save_debug_html(html, path, &highlights)
}

/// Persists a page that could not be parsed: the raw body under `name`, plus
/// an `.annotated.html` companion highlighting [`PAGE_MARKERS`].
pub fn dump_page(dir: &Path, name: &str, html: &str) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir)?;
    let raw_path = dir.join(name);
    fs::write(&raw_path, html)?;

    let stem = raw_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let annotated_path = dir.join(format!("{}.annotated.html", stem));
    if let Err(e) = create_debug_html(html, &annotated_path, PAGE_MARKERS) {
        tracing::warn!("Failed to create annotated debug HTML: {}", e);
    }

    tracing::info!("Saved offending page to {}", raw_path.display());
    Ok(raw_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_writes_raw_and_annotated_copies() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<table class="peptide"><tr><td><b>Source:</b></td></tr></table>"#;

        let raw = dump_page(dir.path(), "debug_record_00001.html", html).unwrap();
        assert_eq!(fs::read_to_string(&raw).unwrap(), html);

        let annotated = fs::read_to_string(dir.path().join("debug_record_00001.annotated.html")).unwrap();
        assert!(annotated.contains("highlight-table"));
        assert!(annotated.contains("<span class=\"highlight-label\""));
    }

    #[test]
    fn overlapping_highlights_do_not_split_markup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        save_debug_html("abcdef", &path, &[(0, 4, "id"), (2, 5, "label")]).unwrap();
        let out = fs::read_to_string(&path).unwrap();
        assert!(out.contains(">abcd</span>ef"));
        assert!(!out.contains("highlight-label\""));
    }
}
