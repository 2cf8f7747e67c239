//! Boundary to the external dense-retrieval engine.
//!
//! The engine owns embedding, indexing and nearest-neighbour search. This crate only
//! opens a prebuilt index and asks it for ranked abstracts.

mod bootstrap;
mod error;
mod http;

pub use bootstrap::{bootstrap, BootstrapPolicy};
pub use error::{BootstrapFailure, EngineInitializationError, IndexLoadError, RetrievalError};
pub use http::{HttpIndexLoader, HttpRetrievalClient};

use crate::core::RecordId;
use async_trait::async_trait;
use serde::Serialize;

/// One ranked hit, in the order the engine returned it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub content: String,
    pub score: f32,
    /// 1-based position in the returned sequence.
    pub rank: usize,
    /// Surrogate id carried back from the index, when the collection was exported with one.
    pub record_id: Option<RecordId>,
}

/// A loaded index that answers relevance queries.
///
/// Implementations must tolerate concurrent calls; the same client is shared by
/// every request the process serves.
#[async_trait]
pub trait RetrievalClient: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError>;
}

/// Opens a prebuilt index by name.
#[async_trait]
pub trait IndexLoader: Send + Sync {
    type Client: RetrievalClient;

    async fn load_index(&self, index: &str) -> Result<Self::Client, IndexLoadError>;
}
