use super::error::{BootstrapFailure, EngineInitializationError};
use super::{IndexLoader, RetrievalClient};
use std::time::Duration;
use tracing::{info, warn};

/// How hard startup tries to bring the retrieval engine up.
#[derive(Debug, Clone)]
pub struct BootstrapPolicy {
    pub index: String,
    pub attempts: u32,
    pub delay: Duration,
    pub smoke_query: String,
    pub smoke_k: usize,
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        BootstrapPolicy {
            index: "paper_abstracts".to_string(),
            attempts: 5,
            delay: Duration::from_millis(500),
            smoke_query: "dummy".to_string(),
            smoke_k: 10,
        }
    }
}

async fn attempt<L: IndexLoader>(
    loader: &L,
    policy: &BootstrapPolicy,
) -> Result<L::Client, BootstrapFailure> {
    let client = loader.load_index(&policy.index).await?;
    client.search(&policy.smoke_query, policy.smoke_k).await?;
    Ok(client)
}

/// Opens the index and proves it answers a query, retrying up to
/// `policy.attempts` times. Exhausting the attempts is fatal for the caller:
/// there is no degraded mode without an engine.
pub async fn bootstrap<L: IndexLoader>(
    loader: &L,
    policy: &BootstrapPolicy,
) -> Result<L::Client, EngineInitializationError> {
    let attempts = policy.attempts.max(1);
    let mut current = 1;

    loop {
        match attempt(loader, policy).await {
            Ok(client) => {
                info!(index = %policy.index, attempt = current, "retrieval engine ready");
                return Ok(client);
            }
            Err(e) => {
                warn!(
                    index = %policy.index,
                    attempt = current,
                    of = attempts,
                    error = %e,
                    "failed to initialize retrieval engine"
                );
                if current >= attempts {
                    return Err(EngineInitializationError {
                        attempts,
                        last_error: e,
                    });
                }
            }
        }
        current += 1;
        tokio::time::sleep(policy.delay).await;
    }
}
