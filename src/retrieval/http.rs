use super::error::{IndexLoadError, RetrievalError};
use super::{IndexLoader, RetrievalClient, SearchHit};
use crate::core::RecordId;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    results: Vec<WireHit>,
}

#[derive(Deserialize, Debug)]
struct WireHit {
    content: String,
    score: f32,
    #[serde(default)]
    document_id: Option<String>,
    #[serde(default)]
    document_metadata: Option<WireMetadata>,
}

#[derive(Deserialize, Debug)]
struct WireMetadata {
    #[serde(default)]
    record_id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct IndexInfo {
    #[serde(default)]
    documents: Option<u64>,
}

impl WireHit {
    fn into_hit(self, position: usize) -> SearchHit {
        let record_id = self
            .document_metadata
            .and_then(|m| m.record_id)
            .and_then(|id| id.parse::<RecordId>().ok())
            .or_else(|| self.document_id.and_then(|id| id.parse::<RecordId>().ok()));

        SearchHit {
            content: self.content,
            score: self.score,
            rank: position + 1,
            record_id,
        }
    }
}

/// Opens indexes hosted by a retrieval service speaking JSON over HTTP.
pub struct HttpIndexLoader {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpIndexLoader {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, IndexLoadError> {
        let endpoint = Url::parse(endpoint)
            .ok()
            .filter(|u| !u.cannot_be_a_base() && matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| IndexLoadError::InvalidEndpoint(endpoint.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexLoadError::Unavailable(e.to_string()))?;

        Ok(HttpIndexLoader {
            client,
            endpoint,
            timeout,
        })
    }

    fn index_url(&self, index: &str, tail: Option<&str>) -> Result<Url, IndexLoadError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| IndexLoadError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push("indexes")
            .push(index)
            .extend(tail);
        Ok(url)
    }
}

#[async_trait]
impl IndexLoader for HttpIndexLoader {
    type Client = HttpRetrievalClient;

    async fn load_index(&self, index: &str) -> Result<HttpRetrievalClient, IndexLoadError> {
        let info_url = self.index_url(index, None)?;
        debug!(url = %info_url, "opening index");

        let response = self
            .client
            .get(info_url)
            .send()
            .await
            .map_err(|e| IndexLoadError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(IndexLoadError::NotFound(index.to_string())),
            status if !status.is_success() => {
                return Err(IndexLoadError::Unavailable(format!(
                    "index lookup returned status {}",
                    status
                )))
            }
            _ => {}
        }

        let documents = response.json::<IndexInfo>().await.ok().and_then(|i| i.documents);
        info!(index, documents, "index opened");

        Ok(HttpRetrievalClient {
            client: self.client.clone(),
            search_url: self.index_url(index, Some("search"))?,
            timeout: self.timeout,
            documents,
        })
    }
}

/// Client for one opened index. Cheap to share: the inner connection pool is
/// reference counted and safe for concurrent use.
#[derive(Clone, Debug)]
pub struct HttpRetrievalClient {
    client: Client,
    search_url: Url,
    timeout: Duration,
    documents: Option<u64>,
}

impl HttpRetrievalClient {
    /// Collection size reported by the service when the index was opened.
    pub fn documents(&self) -> Option<u64> {
        self.documents
    }
}

#[async_trait]
impl RetrievalClient for HttpRetrievalClient {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        let response = self
            .client
            .post(self.search_url.clone())
            .json(&SearchRequest { query, k })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout(self.timeout)
                } else {
                    RetrievalError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            return Err(if status.is_client_error() {
                RetrievalError::Rejected {
                    status: status.as_u16(),
                    message,
                }
            } else {
                RetrievalError::Unavailable(format!("status {}: {}", status, message))
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                RetrievalError::Timeout(self.timeout)
            } else {
                RetrievalError::Unavailable(e.to_string())
            }
        })?;
        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .enumerate()
            .map(|(i, hit)| hit.into_hit(i))
            .collect())
    }
}
