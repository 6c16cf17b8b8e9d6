//! The remote inference boundary.
//!
//! Everything past [`InferenceEndpoint`] is an external collaborator: the
//! pipeline only needs a byte payload in and response bytes out. The HTTP
//! implementation lives here; tests swap in
//! [`MockEndpoint`](crate::embedding::mock::MockEndpoint) instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

use crate::types::AttemptError;

/// Content type the embedding models accept for raw text payloads.
const TEXT_CONTENT_TYPE: &str = "application/x-text";

/// A single remote inference call: payload bytes in, response bytes out.
///
/// Implementations must be safe for concurrent use; one endpoint handle is
/// shared across all workers in the pool.
#[async_trait]
pub trait InferenceEndpoint: Send + Sync {
    async fn invoke(&self, payload: &[u8]) -> Result<Vec<u8>, AttemptError>;
}

/// HTTP endpoint posting UTF-8 text and expecting a JSON response.
#[derive(Clone, Debug)]
pub struct HttpEndpoint {
    client: Client,
    url: Url,
    timeout: Option<Duration>,
}

impl HttpEndpoint {
    /// Creates an endpoint with a default client.
    pub fn new(url: Url) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Creates an endpoint reusing an existing client (connection pooling).
    pub fn with_client(client: Client, url: Url) -> Self {
        Self {
            client,
            url,
            timeout: None,
        }
    }

    /// Per-call timeout, passed through to the HTTP request. Timeouts count
    /// as transport failures and consume a retry attempt.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Target URL of this endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl InferenceEndpoint for HttpEndpoint {
    async fn invoke(&self, payload: &[u8]) -> Result<Vec<u8>, AttemptError> {
        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(payload.to_vec());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(AttemptError::transport)?
            .error_for_status()
            .map_err(AttemptError::transport)?;

        let body = response.bytes().await.map_err(AttemptError::transport)?;
        Ok(body.to_vec())
    }
}
