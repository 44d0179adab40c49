// src/pipeline.rs
use std::ops::Range;
use std::time::Duration;

use rand::Rng;

use crate::apd::client::PageSource;
use crate::apd::models::Record;
use crate::extractors::{
    compute_top_k, extract_ids, extract_sections, parse_record_page, HeaderCounts, SectionConfig,
    SectionMap, TopHeaderSet,
};
use crate::storage::StorageManager;
use crate::utils::error::{AppError, ExtractError};

/// Random pause before each record fetch, in milliseconds.
pub const DEFAULT_PAUSE_MS: Range<u64> = 200..600;

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub limit: Option<usize>,
    pub pause_ms: Range<u64>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self { limit: None, pause_ms: DEFAULT_PAUSE_MS }
    }
}

/// Discovers identifiers and fetches each record page in turn, appending
/// every parsed record to the raw CSV before the next request.
///
/// Any fetch or parse failure aborts the crawl. Rows written so far stay on disk.
pub async fn crawl<S: PageSource>(
    source: &S,
    storage: &StorageManager,
    options: &CrawlOptions,
) -> Result<Vec<Record>, AppError> {
    let listing = source.search_results().await?;
    let mut ids = match extract_ids(&listing) {
        Ok(ids) => ids,
        Err(e) => {
            keep_debug_page(storage, "debug_result.html", &listing);
            return Err(e.into());
        }
    };
    if let Some(limit) = options.limit {
        ids.truncate(limit);
    }

    let mut writer = storage.open_raw_writer()?;
    let mut records = Vec::with_capacity(ids.len());
    let total = ids.len();

    for (i, id) in ids.iter().enumerate() {
        pause(&options.pause_ms).await;

        let page = source.record_page(id).await?;
        let record = match parse_record_page(&page) {
            Ok(r) => r,
            Err(e) => {
                keep_debug_page(storage, &format!("debug_record_{}.html", id), &page);
                return Err(e.into());
            }
        };

        writer.append(&record)?;
        tracing::info!("{}/{}: {}", i + 1, total, record.apd_id);
        records.push(record);
    }

    tracing::info!("Done. Wrote {} rows to {}", writer.rows(), storage.raw_path().display());
    Ok(records)
}

// A failed dump must not replace the structural error that triggered it.
fn keep_debug_page(storage: &StorageManager, name: &str, html: &str) {
    if let Err(e) = storage.save_debug_page(name, html) {
        tracing::warn!("Could not save {}: {}", name, e);
    }
}

async fn pause(range: &Range<u64>) {
    if range.is_empty() {
        return;
    }
    let ms = rand::rng().random_range(range.clone());
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Corpus-wide header statistics plus the per-record section maps built from them.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub top_headers: TopHeaderSet,
    pub header_counts: HeaderCounts,
    pub sections: Vec<SectionMap>,
}

/// Counts headers over every record first, then extracts the selected
/// sections record by record against that fixed selection.
pub fn enrich(records: &[Record], cfg: &SectionConfig) -> Enrichment {
    let (top_headers, header_counts) =
        compute_top_k(records.iter().map(|r| r.additional_info.as_str()), cfg);

    let sections = records
        .iter()
        .map(|r| extract_sections(&r.additional_info, &top_headers))
        .collect();

    Enrichment { top_headers, header_counts, sections }
}

/// Surfaced to the caller when zero identifiers were discovered, which
/// points at the discovery step rather than at individual fetches.
pub fn is_empty_corpus(err: &AppError) -> bool {
    matches!(err, AppError::Extraction(ExtractError::NoIdentifiers))
}
