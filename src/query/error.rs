use crate::retrieval::RetrievalError;
use thiserror::Error;

/// Per-request failure. Distinct from an empty result, which is `Ok(vec![])`.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Search is unavailable: {0}")]
    RetrievalUnavailable(#[source] RetrievalError),
}
