use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Failed to read metadata source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported metadata format '{0}' (expected .csv or .bib)")]
    UnsupportedFormat(String),

    #[error("Metadata source is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Invalid year '{value}' in record {row}")]
    InvalidYear { row: usize, value: String },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed BibTeX: {0}")]
    Bibtex(String),
}
