//! Token-aware chunking and remote embedding for RAG ingestion.
//!
//! ```text
//! raw text ──► chunking::RecursiveChunker ──► ordered Chunks
//!                       │                          │
//!                       └─ chunking::TokenCounter  │
//!                                                  ▼
//!                          embedding::EmbeddingClient (bounded retry)
//!                                   │
//!                                   └─► embedding::InferenceEndpoint
//!                                                  │
//! VectorizationResult ◄── vectorizer::DocumentVectorizer (worker pool,
//!      (chunks ↔ vectors, 1:1)          index-tagged result collection)
//! ```
//!
//! The chunker splits documents on a priority-ordered separator list with a
//! token budget and overlap carry-over; the client drives each chunk through
//! a remote embedding endpoint with a fixed-delay retry budget; the
//! vectorizer fans the calls out over a bounded worker pool while keeping
//! the chunk/vector sequences positionally aligned. Persisting the resulting
//! pairs in a vector store is the caller's business.

pub mod chunking;
pub mod config;
pub mod embedding;
pub mod types;
pub mod vectorizer;

#[cfg(feature = "tiktoken")]
pub use chunking::TiktokenCounter;
pub use chunking::{RecursiveChunker, TokenCounter, WordCounter};
pub use config::{ChunkerConfig, RetryConfig, VectorizerConfig};
pub use embedding::{EmbeddingClient, HttpEndpoint, InferenceEndpoint, MockEndpoint};
pub use types::{
    AttemptError, Chunk, ConfigError, DocumentVectorizationFailed, EmbeddingUnavailable,
    VectorizationResult,
};
pub use vectorizer::{DocumentVectorizer, DocumentVectorizerBuilder};
