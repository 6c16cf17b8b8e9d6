//! Embedding calls with bounded retry.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::embedding::endpoint::InferenceEndpoint;
use crate::types::{AttemptError, ConfigError, EmbeddingUnavailable};

/// Response shape shared by the known backing models: the single embedding
/// arrives wrapped in one extra outer array layer.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<Vec<f32>>,
}

/// Drives one chunk of text through the remote endpoint, retrying transient
/// failures on a fixed-delay budget.
///
/// Transport failures and malformed responses share the same budget; the
/// per-attempt log line carries the classification so the two stay
/// distinguishable in diagnostics.
#[derive(Clone)]
pub struct EmbeddingClient {
    endpoint: Arc<dyn InferenceEndpoint>,
    retry: RetryConfig,
}

impl EmbeddingClient {
    pub fn new(
        endpoint: Arc<dyn InferenceEndpoint>,
        retry: RetryConfig,
    ) -> Result<Self, ConfigError> {
        retry.validate()?;
        Ok(Self { endpoint, retry })
    }

    /// The retry policy in effect.
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Embeds one chunk of text, returning the model's vector.
    ///
    /// Fails with [`EmbeddingUnavailable`] once `max_retries` attempts are
    /// exhausted, carrying the last attempt's error. No placeholder vector is
    /// ever substituted.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingUnavailable> {
        let payload = text.as_bytes();
        let mut last_error: Option<AttemptError> = None;

        for attempt in 1..=self.retry.max_retries {
            match self.attempt(payload).await {
                Ok(vector) => {
                    debug!(attempt, dimension = vector.len(), "embedding resolved");
                    return Ok(vector);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        kind = err.kind(),
                        error = %err,
                        "embedding attempt failed"
                    );
                    last_error = Some(err);
                    if attempt < self.retry.max_retries {
                        tokio::time::sleep(self.retry.retry_delay).await;
                    }
                }
            }
        }

        // max_retries is validated non-zero, so the loop ran at least once.
        let source = last_error.unwrap_or_else(|| {
            AttemptError::MalformedResponse("no attempt was made".to_string())
        });
        Err(EmbeddingUnavailable {
            attempts: self.retry.max_retries,
            source,
        })
    }

    async fn attempt(&self, payload: &[u8]) -> Result<Vec<f32>, AttemptError> {
        let body = self.endpoint.invoke(payload).await?;
        parse_response(&body)
    }
}

impl std::fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Unwraps exactly one outer array layer and returns the inner vector.
fn parse_response(body: &[u8]) -> Result<Vec<f32>, AttemptError> {
    let parsed: EmbeddingResponse = serde_json::from_slice(body)
        .map_err(|err| AttemptError::MalformedResponse(err.to_string()))?;
    parsed
        .embedding
        .into_iter()
        .next()
        .ok_or_else(|| AttemptError::MalformedResponse("empty embedding array".to_string()))
}
