// src/main.rs
mod apd;
mod extractors;
mod pipeline;
mod storage;
mod utils;

use clap::Parser;

use apd::{ApdClient, ClientConfig};
use extractors::{section_column_name, SectionConfig};
use pipeline::CrawlOptions;
use storage::{RunMetadata, StorageManager};
use utils::AppError;

/// Scrapes the APD6 peptide database into a CSV table, then splits the
/// most common "Additional info" sections into their own columns.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Only fetch the first N records of the result listing (0 writes just the header row)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Raw CSV output path; the enriched table and metadata are written next to it
    #[arg(short, long, default_value = "apd6_peptides_raw_data.csv")]
    output: String,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    if std::path::Path::new(&args.output).is_dir() {
        return Err(AppError::Config(format!("--output {} is a directory", args.output)));
    }

    // 3. Initialize storage and the HTTP session
    let storage = StorageManager::new(&args.output)?;
    let client = ApdClient::new(ClientConfig {
        debug_dir: storage.debug_dir(),
        ..ClientConfig::default()
    })?;

    // 4. Crawl: every record is on disk before the next one is requested
    let options = CrawlOptions { limit: args.limit, ..CrawlOptions::default() };
    let records = match pipeline::crawl(&client, &storage, &options).await {
        Ok(records) => records,
        Err(e) => {
            if pipeline::is_empty_corpus(&e) {
                tracing::error!("The empty search returned no peptide identifiers; discovery is broken");
            } else {
                tracing::error!("Crawl aborted: {}", e);
            }
            tracing::info!("Rows written so far remain in {}", storage.raw_path().display());
            return Err(e);
        }
    };

    // 5. Two passes over the finished corpus: header statistics, then sections
    let cfg = SectionConfig::default();
    let enrichment = pipeline::enrich(&records, &cfg);
    let columns: Vec<String> = enrichment
        .top_headers
        .headers()
        .iter()
        .map(|h| section_column_name(h))
        .collect();
    tracing::info!("Added columns: {:?}", columns);

    storage.save_enriched(&records, &enrichment.top_headers, &enrichment.sections)?;

    let metadata = RunMetadata {
        records: records.len(),
        usable_records: records.iter().filter(|r| r.is_usable()).count(),
        top_headers: &enrichment.top_headers,
        section_columns: columns,
        header_counts: &enrichment.header_counts,
        config: &cfg,
        extraction_timestamp: chrono::Utc::now().to_rfc3339(),
    };
    storage.save_run_metadata(&metadata)?;

    tracing::info!("Processing finished. Records: {}, usable: {}", metadata.records, metadata.usable_records);
    Ok(())
}
