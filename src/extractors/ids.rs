// src/extractors/ids.rs
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::utils::error::ExtractError;

// Result rows carry the record id in a hidden input: <input name="ID" value="00123">
static ID_INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"name=["']ID["']\s+value=["'](\d{5})["']"#).expect("Failed to compile ID_INPUT_RE")
});

static ID_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}$").expect("Failed to compile ID_VALUE_RE"));

static ID_INPUT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input[name='ID']").expect("Failed to compile ID_INPUT_SELECTOR"));

/// Record identifiers referenced on a result listing, in order of first appearance.
pub fn extract_ids(html: &str) -> Result<Vec<String>, ExtractError> {
    let direct: Vec<String> = ID_INPUT_RE
        .captures_iter(html)
        .map(|caps| caps[1].to_string())
        .collect();

    let ids = if direct.is_empty() {
        tracing::debug!("No inline ID matches, scanning input elements");
        scan_id_inputs(html)
    } else {
        direct
    };

    let ids = dedup_first_seen(ids);
    if ids.is_empty() {
        return Err(ExtractError::NoIdentifiers);
    }
    tracing::info!("Found {} peptide identifiers", ids.len());
    Ok(ids)
}

/// Attribute order or quoting can defeat the regex; the DOM does not care.
fn scan_id_inputs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ID_INPUT_SELECTOR)
        .filter_map(|input| input.value().attr("value"))
        .map(str::trim)
        .filter(|v| ID_VALUE_RE.is_match(v))
        .map(str::to_string)
        .collect()
}

fn dedup_first_seen(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keeps_first_position() {
        let html = r#"
            <form><input type="hidden" name="ID" value="00007"></form>
            <form><input type="hidden" name='ID' value='00002'></form>
            <form><input type="hidden" name="ID" value="00007"></form>
            <form><input type="hidden" name="ID" value="00010"></form>
        "#;
        assert_eq!(extract_ids(html).unwrap(), vec!["00007", "00002", "00010"]);
    }

    #[test]
    fn falls_back_to_dom_when_attributes_reordered() {
        let html = r#"
            <input value="00031" type="hidden" name="ID">
            <input value=" 00032 " name="ID">
            <input value="123" name="ID">
            <input value="00031" name="ID">
            <input value="00099" name="other">
        "#;
        assert_eq!(extract_ids(html).unwrap(), vec!["00031", "00032"]);
    }

    #[test]
    fn regex_hits_win_over_dom_scan() {
        let html = r#"<input name="ID" value="00001"><input value="00002" name="ID">"#;
        assert_eq!(extract_ids(html).unwrap(), vec!["00001"]);
    }

    #[test]
    fn six_digit_values_are_not_identifiers() {
        let html = r#"<input name="ID" value="123456">"#;
        assert!(matches!(extract_ids(html), Err(ExtractError::NoIdentifiers)));
    }

    #[test]
    fn empty_listing_is_an_error() {
        assert!(matches!(extract_ids("<html><body>No results</body></html>"), Err(ExtractError::NoIdentifiers)));
    }
}
