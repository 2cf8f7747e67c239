use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Download failed with HTTP {code} from {url}")]
    Http { code: u16, url: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bibliography error: {0}")]
    Bibtex(#[from] crate::bibtex::BibtexError),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Source bibliography not found: {0} (run with --download first)")]
    MissingSource(PathBuf),
}

impl PrepareError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| PrepareError::Io { path, source }
    }
}
