// src/storage/mod.rs
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::apd::models::{Record, CSV_FIELDS};
use crate::extractors::{section_column_name, HeaderCounts, SectionConfig, SectionMap, TopHeaderSet};
use crate::utils::error::StorageError;
use crate::utils::html_debug;

/// Output locations derived from the raw CSV path: the enriched table and
/// run metadata sit next to it, debug dumps in a `debug/` subdirectory.
pub struct StorageManager {
    base_dir: PathBuf,
    raw_path: PathBuf,
    stem: String,
}

/// Appends records to the raw CSV one at a time. Each row is flushed before
/// the next fetch, so an aborted run leaves a valid, truncated file.
pub struct RecordWriter {
    writer: csv::Writer<File>,
    rows: usize,
}

impl RecordWriter {
    pub fn append(&mut self, record: &Record) -> Result<(), StorageError> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Summary written alongside the enriched table.
#[derive(Debug, Serialize)]
pub struct RunMetadata<'a> {
    pub records: usize,
    pub usable_records: usize,
    pub top_headers: &'a TopHeaderSet,
    pub section_columns: Vec<String>,
    pub header_counts: &'a HeaderCounts,
    pub config: &'a SectionConfig,
    pub extraction_timestamp: String,
}

impl StorageManager {
    /// Creates the parent directory of `raw_path` if needed.
    pub fn new<P: AsRef<Path>>(raw_path: P) -> Result<Self, StorageError> {
        let raw_path = raw_path.as_ref().to_path_buf();
        let base_dir = match raw_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
        }
        let stem = raw_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "apd6_peptides".to_string());

        Ok(Self { base_dir, raw_path, stem })
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub fn enriched_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}_addinfo_topk.csv", self.stem))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}_meta.json", self.stem))
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.base_dir.join("debug")
    }

    /// Truncates the raw CSV and writes its header row.
    pub fn open_raw_writer(&self) -> Result<RecordWriter, StorageError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.raw_path)?;
        writer.write_record(CSV_FIELDS)?;
        writer.flush()?;
        tracing::info!("Writing records to {}", self.raw_path.display());
        Ok(RecordWriter { writer, rows: 0 })
    }

    /// Raw columns followed by one column per selected section header.
    pub fn save_enriched(
        &self,
        records: &[Record],
        top: &TopHeaderSet,
        sections: &[SectionMap],
    ) -> Result<PathBuf, StorageError> {
        let path = self.enriched_path();
        let mut writer = csv::Writer::from_path(&path)?;

        let header: Vec<String> = CSV_FIELDS
            .iter()
            .map(|f| f.to_string())
            .chain(top.headers().iter().map(|h| section_column_name(h)))
            .collect();
        writer.write_record(&header)?;

        for (record, map) in records.iter().zip(sections) {
            let row: Vec<&str> = record.to_row().into_iter().chain(map.to_row()).collect();
            writer.write_record(&row)?;
        }
        writer.flush()?;

        tracing::info!("Saved enriched table ({} rows) to {}", records.len(), path.display());
        Ok(path)
    }

    pub fn save_run_metadata(&self, metadata: &RunMetadata) -> Result<PathBuf, StorageError> {
        let path = self.metadata_path();
        let json = serde_json::to_string_pretty(metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&path, json)?;
        tracing::info!("Saved run metadata to {}", path.display());
        Ok(path)
    }

    /// Keeps a page that failed structural parsing for later inspection.
    pub fn save_debug_page(&self, name: &str, html: &str) -> Result<PathBuf, StorageError> {
        html_debug::dump_page(&self.debug_dir(), name, html)
    }
}
