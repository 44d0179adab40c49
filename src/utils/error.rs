// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Connect errors, timeouts, body reads

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // Any non-2xx status

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed after {attempts} attempts: {method} {url}")]
    Exhausted {
        method: String,
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No record table found (table.peptide)")]
    NoRecordTable,

    #[error("No peptide identifiers found on the result page")]
    NoIdentifiers,

    #[error("Search form not found on the database page")]
    SearchFormNotFound,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Fetching failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

