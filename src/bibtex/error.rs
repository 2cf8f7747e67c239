use thiserror::Error;

#[derive(Error, Debug)]
pub enum BibtexError {
    #[error("Failed to parse BibTeX: {0}")]
    ParseFailed(String),

    #[error("No entries found in BibTeX")]
    NoEntries,
}
