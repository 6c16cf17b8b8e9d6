//! Core data model and error taxonomy shared across the pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A bounded contiguous span of document text, the unit of embedding.
///
/// Chunks are produced in document order by the
/// [`RecursiveChunker`](crate::chunking::RecursiveChunker); the position of a
/// chunk within its sequence is what pairs it with its embedding vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text, a contiguous substring of the source document.
    pub content: String,
    /// Token count as measured by the counter the chunker was built with.
    pub token_count: usize,
}

impl Chunk {
    pub fn new(content: impl Into<String>, token_count: usize) -> Self {
        Self {
            content: content.into(),
            token_count,
        }
    }
}

/// Aligned output of a successful vectorization run.
///
/// `vectors[i]` is the embedding of `chunks[i]`; the two sequences always
/// have equal length. This positional correspondence survives concurrent
/// dispatch because results are written back by chunk index, never by
/// completion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorizationResult {
    pub chunks: Vec<Chunk>,
    pub vectors: Vec<Vec<f32>>,
}

impl VectorizationResult {
    /// Number of (chunk, vector) pairs.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` when the document produced no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterates over aligned `(chunk, vector)` pairs, ready for persistence
    /// in a vector store.
    pub fn pairs(&self) -> impl Iterator<Item = (&Chunk, &[f32])> {
        self.chunks
            .iter()
            .zip(self.vectors.iter().map(Vec::as_slice))
    }

    /// Consumes the result and yields owned `(chunk, vector)` pairs.
    pub fn into_pairs(self) -> impl Iterator<Item = (Chunk, Vec<f32>)> {
        self.chunks.into_iter().zip(self.vectors)
    }
}

/// Parameter contract violations, reported before any remote call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge {
        chunk_overlap: usize,
        chunk_size: usize,
    },

    #[error("max_retries must be greater than zero")]
    ZeroRetries,

    #[error("worker pool size must be greater than zero")]
    ZeroWorkers,

    #[error("unknown tokenizer encoding '{0}'")]
    UnknownEncoding(String),

    #[error("failed to load tokenizer: {0}")]
    Tokenizer(String),
}

/// Failure of a single embedding attempt.
///
/// Transport and malformed-response failures share one retry budget but are
/// kept distinct so logs can tell an unreachable endpoint apart from a
/// reachable one that returned garbage.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Network-level failure reaching the endpoint, including non-success
    /// HTTP statuses and timeouts.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Endpoint reachable but the response body did not have the expected
    /// `{"embedding": [[..]]}` shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl AttemptError {
    /// Builds a transport error from any source error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        AttemptError::Transport(Box::new(err))
    }

    /// Short label used when classifying attempt failures in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Transport(_) => "transport",
            AttemptError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Retry budget exhausted for one chunk; carries the last attempt's error.
#[derive(Debug, Error)]
#[error("embedding unavailable after {attempts} attempts: {source}")]
pub struct EmbeddingUnavailable {
    /// Total attempts made, equal to the configured `max_retries`.
    pub attempts: u32,
    #[source]
    pub source: AttemptError,
}

/// Whole-document failure: one chunk exhausted its retry budget.
///
/// Carries everything resolved before the failure so the caller can decide
/// between resubmitting the document and accepting partial coverage. The
/// pipeline itself never resumes mid-document.
#[derive(Debug, Error)]
#[error("vectorization failed at chunk {failed_index} of {chunk_count}: {source}")]
pub struct DocumentVectorizationFailed {
    /// Index of the failing chunk (lowest index when several fail).
    pub failed_index: usize,
    /// Total chunks the document split into.
    pub chunk_count: usize,
    /// The full chunk sequence, so partial vectors can be matched to text.
    pub chunks: Vec<Chunk>,
    /// Vectors that did resolve, tagged with their chunk index, ascending.
    pub completed: Vec<(usize, Vec<f32>)>,
    #[source]
    pub source: EmbeddingUnavailable,
}
