// src/apd/models.rs
use std::collections::HashMap;

use serde::Serialize;

/// Column order of the raw record table.
pub const CSV_FIELDS: [&str; 18] = [
    "APD ID",
    "Name/Class",
    "Source",
    "Sequence",
    "Length",
    "Net charge",
    "Hydrophobic residue%",
    "Boman Index",
    "3D Structure",
    "Method",
    "Activity",
    "Crucial residues",
    "Additional info",
    "History and discovery",
    "Sequence analysis",
    "Title",
    "Author",
    "Reference",
];

/// One peptide entry as scraped from its record page.
/// Every attribute is a string; a missing one is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "APD ID")]
    pub apd_id: String,
    #[serde(rename = "Name/Class")]
    pub name_class: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Sequence")]
    pub sequence: String,
    #[serde(rename = "Length")]
    pub length: String,
    #[serde(rename = "Net charge")]
    pub net_charge: String,
    #[serde(rename = "Hydrophobic residue%")]
    pub hydrophobic_residue: String,
    #[serde(rename = "Boman Index")]
    pub boman_index: String,
    #[serde(rename = "3D Structure")]
    pub structure_3d: String,
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "Activity")]
    pub activity: String,
    #[serde(rename = "Crucial residues")]
    pub crucial_residues: String,
    #[serde(rename = "Additional info")]
    pub additional_info: String,
    #[serde(rename = "History and discovery")]
    pub history: String,
    #[serde(rename = "Sequence analysis")]
    pub sequence_analysis: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Reference")]
    pub reference: String,
}

impl Record {
    /// Builds a record from the key/value table of a record page. Keys are
    /// matched exactly against the column names; unknown keys are ignored.
    pub fn from_table(table: &HashMap<String, String>) -> Self {
        let get = |key: &str| table.get(key).cloned().unwrap_or_default();
        Self {
            apd_id: get("APD ID"),
            name_class: get("Name/Class"),
            source: get("Source"),
            sequence: get("Sequence"),
            length: get("Length"),
            net_charge: get("Net charge"),
            hydrophobic_residue: get("Hydrophobic residue%"),
            boman_index: get("Boman Index"),
            structure_3d: get("3D Structure"),
            method: get("Method"),
            activity: get("Activity"),
            crucial_residues: get("Crucial residues"),
            title: get("Title"),
            author: get("Author"),
            reference: get("Reference"),
            ..Self::default()
        }
    }

    /// Field values in [`CSV_FIELDS`] order.
    pub fn to_row(&self) -> [&str; 18] {
        [
            &self.apd_id,
            &self.name_class,
            &self.source,
            &self.sequence,
            &self.length,
            &self.net_charge,
            &self.hydrophobic_residue,
            &self.boman_index,
            &self.structure_3d,
            &self.method,
            &self.activity,
            &self.crucial_residues,
            &self.additional_info,
            &self.history,
            &self.sequence_analysis,
            &self.title,
            &self.author,
            &self.reference,
        ]
    }

    /// Identifier and sequence are both required downstream.
    pub fn is_usable(&self) -> bool {
        !self.apd_id.is_empty() && !self.sequence.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_ignored_and_missing_keys_empty() {
        let table = HashMap::from([
            ("APD ID".to_string(), "AP00001".to_string()),
            ("Sequence".to_string(), "GLFDIVKKVVGALGSL".to_string()),
            ("Color".to_string(), "green".to_string()),
        ]);
        let record = Record::from_table(&table);
        assert_eq!(record.apd_id, "AP00001");
        assert_eq!(record.source, "");
        assert!(record.is_usable());
        assert!(!record.to_row().contains(&"green"));
    }

    #[test]
    fn row_order_matches_header() {
        let record = Record {
            apd_id: "id".into(),
            sequence: "seq".into(),
            history: "hist".into(),
            reference: "ref".into(),
            ..Record::default()
        };
        let row = record.to_row();
        let pos = |name: &str| CSV_FIELDS.iter().position(|f| *f == name).unwrap();
        assert_eq!(row[pos("APD ID")], "id");
        assert_eq!(row[pos("Sequence")], "seq");
        assert_eq!(row[pos("History and discovery")], "hist");
        assert_eq!(row[pos("Reference")], "ref");
    }

    #[test]
    fn record_without_sequence_is_not_usable() {
        let record = Record { apd_id: "AP1".into(), ..Record::default() };
        assert!(!record.is_usable());
    }
}
