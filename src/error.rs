use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Failed to load metadata: {0}")]
    DataLoad(#[from] crate::metadata::DataLoadError),

    #[error("{0}")]
    Engine(#[from] crate::retrieval::EngineInitializationError),

    #[error("Cannot reach the retrieval service: {0}")]
    IndexLoad(#[from] crate::retrieval::IndexLoadError),

    #[error("{0}")]
    Query(#[from] crate::query::QueryError),

    #[error("Data preparation failed: {0}")]
    Prepare(#[from] crate::commands::prepare::PrepareError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Errors that mean the process cannot serve anything at all.
    pub fn is_fatal_startup(&self) -> bool {
        matches!(
            self,
            AppError::DataLoad(_) | AppError::Engine(_) | AppError::IndexLoad(_)
        )
    }
}
