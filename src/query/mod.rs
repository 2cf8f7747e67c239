//! Query orchestration: validate, ask the retrieval engine, join to metadata.

mod error;
pub use error::QueryError;

use crate::core::RankedPaper;
use crate::metadata::{MetadataIndex, RecordKey};
use crate::retrieval::{RetrievalClient, RetrievalError, SearchHit};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_K: usize = 5;

/// Settings for one request, validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySettings {
    pub query_text: String,
    pub k: usize,
    pub min_year: i64,
}

impl QuerySettings {
    /// Builds settings from raw user input. `k` is signed so that adapters can
    /// pass through whatever the user typed and get a uniform rejection.
    pub fn new(query_text: impl Into<String>, k: i64, min_year: i64) -> Result<Self, QueryError> {
        let query_text = query_text.into();
        validate_text(&query_text)?;
        let k = usize::try_from(k)
            .ok()
            .filter(|k| *k > 0)
            .ok_or_else(|| QueryError::InvalidQuery(format!("k must be positive, got {}", k)))?;

        Ok(QuerySettings {
            query_text,
            k,
            min_year,
        })
    }
}

fn validate_text(text: &str) -> Result<(), QueryError> {
    if text.trim().is_empty() {
        return Err(QueryError::InvalidQuery("query text is empty".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Upper bound on one call into the retrieval engine.
    pub timeout: Duration,
    /// Extra attempts after a transient failure.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Everything a request needs, built once at startup and shared by all adapters.
pub struct SearchContext<C> {
    client: Arc<C>,
    metadata: Arc<MetadataIndex>,
    options: QueryOptions,
}

impl<C> Clone for SearchContext<C> {
    fn clone(&self) -> Self {
        SearchContext {
            client: Arc::clone(&self.client),
            metadata: Arc::clone(&self.metadata),
            options: self.options.clone(),
        }
    }
}

impl<C: RetrievalClient> SearchContext<C> {
    pub fn new(client: C, metadata: MetadataIndex, options: QueryOptions) -> Self {
        SearchContext {
            client: Arc::new(client),
            metadata: Arc::new(metadata),
            options,
        }
    }

    pub fn metadata(&self) -> &MetadataIndex {
        &self.metadata
    }

    pub async fn run(&self, settings: &QuerySettings) -> Result<Vec<RankedPaper>, QueryError> {
        self.query(&settings.query_text, settings.k, settings.min_year)
            .await
    }

    /// Returns at most `k` records in the engine's relevance order, skipping hits
    /// without metadata and records older than `min_year`.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        min_year: i64,
    ) -> Result<Vec<RankedPaper>, QueryError> {
        validate_text(text)?;
        if k == 0 {
            return Err(QueryError::InvalidQuery("k must be positive, got 0".to_string()));
        }

        let started = Instant::now();
        let mut hits = self
            .search_with_retry(text.trim(), k)
            .await
            .map_err(QueryError::RetrievalUnavailable)?;
        hits.truncate(k);

        let keys: Vec<(RecordKey, f32)> = hits
            .into_iter()
            .map(|hit| {
                let key = RecordKey::Hit {
                    id: hit.record_id,
                    text: hit.content,
                };
                (key, hit.score)
            })
            .collect();
        let results: Vec<RankedPaper> = self
            .metadata
            .resolve_tagged(keys.iter().map(|(key, score)| (key, *score)), min_year)
            .into_iter()
            .enumerate()
            .map(|(i, (record, score))| RankedPaper {
                rank: i + 1,
                score,
                record: record.clone(),
            })
            .collect();

        debug!(
            query = text,
            k,
            min_year,
            hits = keys.len(),
            returned = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query served"
        );
        Ok(results)
    }

    async fn search_with_retry(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        let mut retries = 0;
        loop {
            let outcome =
                match tokio::time::timeout(self.options.timeout, self.client.search(text, k)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(RetrievalError::Timeout(self.options.timeout)),
                };

            match outcome {
                Err(e) if e.is_transient() && retries < self.options.retries => {
                    retries += 1;
                    warn!(error = %e, retry = retries, "retrieval call failed, retrying");
                    tokio::time::sleep(self.options.retry_delay * retries).await;
                }
                other => return other,
            }
        }
    }
}
