// src/extractors/record.rs
use std::collections::HashMap;

use once_cell::sync::Lazy;
use scraper::{node::Node, ElementRef, Html, Selector};

use crate::apd::models::Record;
use crate::extractors::headers::TopHeaderSet;
use crate::extractors::sections::extract_sections;
use crate::utils::error::ExtractError;
use crate::utils::text::{joined_text, normalize_ws};

pub const HISTORY_LABEL: &str = "history and discovery";
pub const SEQUENCE_ANALYSIS_LABEL: &str = "sequence analysis";
const ADDITIONAL_INFO_KEY: &str = "additional info";

static RECORD_TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.peptide").expect("Failed to compile RECORD_TABLE_SELECTOR"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));
static SEQUENCE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.peptide_sequence").expect("Failed to compile SEQUENCE_SELECTOR"));
static BOLD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("b").expect("Failed to compile BOLD_SELECTOR"));

static ALWAYS_EXTRACTED: Lazy<TopHeaderSet> =
    Lazy::new(|| TopHeaderSet::new([HISTORY_LABEL, SEQUENCE_ANALYSIS_LABEL]));

/// Parses one record page into a [`Record`].
///
/// The page must contain `table.peptide`; each two-cell row becomes one
/// attribute. Attributes the page does not list stay empty.
pub fn parse_record_page(html: &str) -> Result<Record, ExtractError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&RECORD_TABLE_SELECTOR)
        .next()
        .ok_or(ExtractError::NoRecordTable)?;

    let mut kv: HashMap<String, String> = HashMap::new();
    let mut additional_cell: Option<ElementRef> = None;

    for row in table.select(&ROW_SELECTOR) {
        let Some((key_cell, value_cell)) = key_value_cells(row) else {
            continue;
        };
        let key = row_key(key_cell);
        if key.is_empty() {
            continue;
        }
        if additional_cell.is_none() && key.eq_ignore_ascii_case(ADDITIONAL_INFO_KEY) {
            additional_cell = Some(value_cell);
        }
        kv.insert(key, normalize_ws(&joined_text(value_cell, "\n")));
    }

    if let Some(seq) = document.select(&SEQUENCE_SELECTOR).next() {
        kv.insert("Sequence".to_string(), normalize_ws(&joined_text(seq, " ")));
    }

    let mut record = Record::from_table(&kv);

    if let Some(cell) = additional_cell {
        record.additional_info = normalize_ws(&joined_text(cell, "\n"));

        let labels = inline_labels(cell);
        let fallback = extract_sections(&record.additional_info, &ALWAYS_EXTRACTED);
        let pick = |label: &str| {
            labels
                .get(label)
                .cloned()
                .or_else(|| fallback.get(label).map(normalize_ws))
                .unwrap_or_default()
        };
        record.history = pick(HISTORY_LABEL);
        record.sequence_analysis = pick(SEQUENCE_ANALYSIS_LABEL);
    } else {
        tracing::debug!("No Additional info row for {}", record.apd_id);
    }

    if !record.is_usable() {
        tracing::warn!(
            "Record is missing its identifier or sequence (id='{}', sequence length {})",
            record.apd_id,
            record.sequence.len()
        );
    }

    Ok(record)
}

/// The two `td` children of a key/value row; rows of any other shape are skipped.
fn key_value_cells(row: ElementRef) -> Option<(ElementRef, ElementRef)> {
    let mut cells = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td");
    let key = cells.next()?;
    let value = cells.next()?;
    if cells.next().is_some() {
        return None;
    }
    Some((key, value))
}

fn row_key(cell: ElementRef) -> String {
    normalize_ws(&joined_text(cell, " "))
        .trim_end_matches(':')
        .to_string()
}

/// Bold labels inside a cell and the text that follows each up to the next
/// bold sibling. Keys are lower-cased label text without the trailing colon.
pub fn inline_labels(cell: ElementRef) -> HashMap<String, String> {
    let mut sections = HashMap::new();

    for bold in cell.select(&BOLD_SELECTOR) {
        let title = normalize_ws(&joined_text(bold, " "));
        let title = title.trim_end_matches(':');
        if title.is_empty() {
            continue;
        }

        let mut parts = Vec::new();
        for sibling in bold.next_siblings() {
            let text = match sibling.value() {
                Node::Text(t) => normalize_ws(t),
                Node::Element(el) if el.name() == "b" => break,
                Node::Element(_) => match ElementRef::wrap(sibling) {
                    Some(el) => normalize_ws(&joined_text(el, " ")),
                    None => continue,
                },
                _ => continue,
            };
            if !text.is_empty() {
                parts.push(text);
            }
        }

        let body = normalize_ws(&parts.join(" "));
        let body = match body.strip_prefix(':') {
            Some(rest) => normalize_ws(rest),
            None => body,
        };
        if !body.is_empty() {
            sections.insert(title.to_lowercase(), body);
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body><h1>APD</h1>
            <table class="peptide">{}</table>
            </body></html>"#,
            rows
        )
    }

    #[test]
    fn table_rows_become_fields() {
        let html = page(
            r#"
            <tr><td>APD ID:</td><td>AP00001</td></tr>
            <tr><td>Name/Class:</td><td>  Buforin   II <br> (Histone-derived) </td></tr>
            <tr><td>Sequence:</td><td>TRSSRAGLQFPVGRVHRLLRK</td></tr>
            <tr><td>Net  charge:</td><td>+6</td></tr>
            <tr><td>Length:</td><td>21</td></tr>
            <tr><td colspan="2">header row</td></tr>
            <tr><td>a</td><td>b</td><td>c</td></tr>
            "#,
        );
        let record = parse_record_page(&html).unwrap();
        assert_eq!(record.apd_id, "AP00001");
        assert_eq!(record.name_class, "Buforin II\n(Histone-derived)");
        assert_eq!(record.sequence, "TRSSRAGLQFPVGRVHRLLRK");
        assert_eq!(record.net_charge, "+6");
        assert_eq!(record.length, "21");
        assert_eq!(record.method, "");
        assert_eq!(record.additional_info, "");
        assert!(record.is_usable());
    }

    #[test]
    fn sequence_marker_overrides_table() {
        let html = format!(
            "{}<p class=\"peptide_sequence\"> GLFDIVKK  VVGALGSL </p>",
            page("<tr><td>APD ID:</td><td>AP00002</td></tr><tr><td>Sequence:</td><td>XXXX</td></tr>")
        );
        let record = parse_record_page(&html).unwrap();
        assert_eq!(record.sequence, "GLFDIVKK VVGALGSL");
    }

    #[test]
    fn bold_labels_fill_history_and_analysis() {
        let html = page(
            r#"
            <tr><td>APD ID:</td><td>AP00003</td></tr>
            <tr><td>Additional info:</td><td>
              <b>History and Discovery:</b> Found in 1987. Isolated from frog skin.<br>
              <b>Sequence Analysis</b>: Alpha helix.<br>
              <b>Other:</b>
            </td></tr>
            "#,
        );
        let record = parse_record_page(&html).unwrap();
        assert_eq!(record.history, "Found in 1987. Isolated from frog skin.");
        assert_eq!(record.sequence_analysis, "Alpha helix.");
        assert!(record.additional_info.starts_with("History and Discovery:\nFound in 1987."));
    }

    #[test]
    fn plain_text_labels_fall_back_to_line_headers() {
        let html = page(
            "<tr><td>Additional info</td><td>History and Discovery: Found in 1987. Isolated from frog skin.\n\
             Sequence Analysis: Alpha helix.</td></tr>",
        );
        let record = parse_record_page(&html).unwrap();
        assert_eq!(record.history, "Found in 1987. Isolated from frog skin.");
        assert_eq!(record.sequence_analysis, "Alpha helix.");
    }

    #[test]
    fn inline_label_body_stops_at_next_bold() {
        let doc = Html::parse_fragment(
            "<table><tr><td><b>Mechanism</b> pores <i>in</i> membranes <b>Target:</b> Gram+ <b> </b></td></tr></table>",
        );
        let td = Selector::parse("td").unwrap();
        let labels = inline_labels(doc.select(&td).next().unwrap());
        assert_eq!(labels.get("mechanism").map(String::as_str), Some("pores in membranes"));
        assert_eq!(labels.get("target").map(String::as_str), Some("Gram+"));
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn missing_additional_info_is_empty_not_error() {
        let record = parse_record_page(&page("<tr><td>APD ID:</td><td>AP00004</td></tr>")).unwrap();
        assert_eq!(record.additional_info, "");
        assert_eq!(record.history, "");
        assert_eq!(record.sequence_analysis, "");
    }

    #[test]
    fn page_without_record_table_fails() {
        let err = parse_record_page("<html><body><table><tr><td>x</td><td>y</td></tr></table></body></html>")
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoRecordTable));
    }
}
