//! Deterministic in-process endpoint for tests and offline runs.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use crate::embedding::endpoint::InferenceEndpoint;
use crate::types::AttemptError;

enum MockResponse {
    /// Always the same vector, wrapped in the standard response shape.
    Fixed(Vec<f32>),
    /// Vector derived from a hash of the payload; same text, same vector.
    Derived { dimension: usize },
    /// Arbitrary bytes, for exercising malformed-response handling.
    Raw(Vec<u8>),
}

/// Scriptable stand-in for a remote embedding endpoint.
///
/// Responses are wrapped in the same `{"embedding": [[..]]}` layer the real
/// models produce. Failures can be scripted with [`fail_times`](Self::fail_times),
/// and [`calls`](Self::calls) exposes how many invocations were observed.
pub struct MockEndpoint {
    response: MockResponse,
    failures_remaining: Mutex<u64>,
    calls: AtomicU64,
}

impl MockEndpoint {
    /// Endpoint that always answers with `vector`.
    pub fn fixed(vector: Vec<f32>) -> Self {
        Self::with_response(MockResponse::Fixed(vector))
    }

    /// Endpoint whose vector is derived deterministically from the payload.
    pub fn derived(dimension: usize) -> Self {
        Self::with_response(MockResponse::Derived { dimension })
    }

    /// Endpoint answering with raw bytes, bypassing the response shape.
    pub fn raw(body: Vec<u8>) -> Self {
        Self::with_response(MockResponse::Raw(body))
    }

    fn with_response(response: MockResponse) -> Self {
        Self {
            response,
            failures_remaining: Mutex::new(0),
            calls: AtomicU64::new(0),
        }
    }

    /// Makes the first `n` invocations fail with a transport error.
    /// Pass `u32::MAX` for an endpoint that never succeeds.
    #[must_use]
    pub fn fail_times(self, n: u32) -> Self {
        *self.failures_remaining.lock() = if n == u32::MAX { u64::MAX } else { u64::from(n) };
        self
    }

    /// Number of invocations observed so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector a [`derived`](Self::derived) endpoint would produce for
    /// `text`; lets tests assert positional chunk/vector alignment.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        match &self.response {
            MockResponse::Fixed(vector) => vector.clone(),
            MockResponse::Derived { dimension } => derive_vector(text.as_bytes(), *dimension),
            MockResponse::Raw(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl InferenceEndpoint for MockEndpoint {
    async fn invoke(&self, payload: &[u8]) -> Result<Vec<u8>, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        {
            let mut remaining = self.failures_remaining.lock();
            if *remaining > 0 {
                if *remaining != u64::MAX {
                    *remaining -= 1;
                }
                return Err(AttemptError::transport(std::io::Error::other(
                    "mock transport failure",
                )));
            }
        }

        let body = match &self.response {
            MockResponse::Fixed(vector) => {
                serde_json::to_vec(&json!({ "embedding": [vector] }))
                    .map_err(|err| AttemptError::MalformedResponse(err.to_string()))?
            }
            MockResponse::Derived { dimension } => {
                let vector = derive_vector(payload, *dimension);
                serde_json::to_vec(&json!({ "embedding": [vector] }))
                    .map_err(|err| AttemptError::MalformedResponse(err.to_string()))?
            }
            MockResponse::Raw(bytes) => bytes.clone(),
        };
        Ok(body)
    }
}

impl std::fmt::Debug for MockEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEndpoint")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

/// Hash-seeded pseudo-vector in `[-1, 1)`, stable across runs for the same
/// payload and dimension.
fn derive_vector(payload: &[u8], dimension: usize) -> Vec<f32> {
    let mut hasher = DefaultHasher::new();
    payload.hash(&mut hasher);
    let mut state = hasher.finish() | 1;

    (0..dimension)
        .map(|_| {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state >> 11) as f32 / (1u64 << 53) as f32).mul_add(2.0, -1.0)
        })
        .collect()
}
