use std::time::Duration;
use thiserror::Error;

/// Failure to open the prebuilt index on the retrieval service.
#[derive(Error, Debug)]
pub enum IndexLoadError {
    #[error("Invalid retrieval endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Index '{0}' not found on the retrieval service")]
    NotFound(String),

    #[error("Retrieval service unreachable: {0}")]
    Unavailable(String),
}

/// Failure of a single `search` call.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Retrieval service unavailable: {0}")]
    Unavailable(String),

    #[error("Retrieval service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Retrieval service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response from retrieval service: {0}")]
    MalformedResponse(String),
}

impl RetrievalError {
    /// Whether trying the same request again can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RetrievalError::Unavailable(_) | RetrievalError::Timeout(_))
    }
}

#[derive(Error, Debug)]
pub enum BootstrapFailure {
    #[error("index load failed: {0}")]
    Load(#[from] IndexLoadError),

    #[error("smoke-test query failed: {0}")]
    Smoke(#[from] RetrievalError),
}

#[derive(Error, Debug)]
#[error("Retrieval engine failed to initialize after {attempts} attempt(s); last error: {last_error}")]
pub struct EngineInitializationError {
    pub attempts: u32,
    #[source]
    pub last_error: BootstrapFailure,
}
