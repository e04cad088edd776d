//! Error types for Logbook Metrics

use thiserror::Error;

/// Errors that can occur while loading logbook rows or computing metrics
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse logbook rows: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Duplicate date in logbook: {0}")]
    DuplicateDate(String),

    #[error("Logbook rows are not in ascending date order at {0}")]
    UnsortedDates(String),

    #[error("Value out of domain: {0}")]
    OutOfDomain(String),

    #[error("Balance input has no dimensions")]
    EmptyDimensions,

    #[error("Unknown habit or activity: {0}")]
    UnknownField(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
