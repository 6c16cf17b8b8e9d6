//! Whole-document orchestration: chunk, embed, zip.
//!
//! Per-chunk embedding calls are independent, so the vectorizer runs them on
//! a bounded worker pool. Dispatch is tagged: each task carries its chunk
//! index and writes its vector into a pre-sized slot array, so the final
//! vector sequence is assembled in chunk order regardless of completion
//! order. After the first exhausted retry budget no new chunks are
//! dispatched; in-flight calls drain cooperatively and their results are
//! still collected into the partial outcome.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

use crate::chunking::{RecursiveChunker, TokenCounter};
use crate::config::VectorizerConfig;
use crate::embedding::{EmbeddingClient, InferenceEndpoint};
use crate::types::{
    ConfigError, DocumentVectorizationFailed, EmbeddingUnavailable, VectorizationResult,
};

#[cfg(not(feature = "tiktoken"))]
use crate::chunking::WordCounter;
#[cfg(feature = "tiktoken")]
use crate::chunking::TiktokenCounter;

/// Orchestrates the chunking-and-embedding pipeline for one document at a
/// time.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use docvex::{DocumentVectorizer, HttpEndpoint};
/// use url::Url;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = Url::parse("https://models.internal/embeddings")?;
/// let vectorizer = DocumentVectorizer::builder()
///     .with_endpoint(Arc::new(HttpEndpoint::new(endpoint)))
///     .build()?;
///
/// let result = vectorizer.vectorize("long document text...").await?;
/// for (chunk, vector) in result.pairs() {
///     println!("{} tokens -> {} dims", chunk.token_count, vector.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct DocumentVectorizer {
    chunker: RecursiveChunker,
    client: Arc<EmbeddingClient>,
    workers: usize,
}

impl DocumentVectorizer {
    /// Create a new builder for constructing a `DocumentVectorizer`.
    pub fn builder() -> DocumentVectorizerBuilder {
        DocumentVectorizerBuilder::default()
    }

    /// The chunker driving step one of the pipeline.
    pub fn chunker(&self) -> &RecursiveChunker {
        &self.chunker
    }

    /// Splits the document and embeds every chunk, preserving order.
    ///
    /// On success `vectors[i]` is the embedding of `chunks[i]`. If any chunk
    /// exhausts its retry budget the whole call fails with
    /// [`DocumentVectorizationFailed`], carrying the failing chunk index and
    /// whatever vectors resolved before the pool drained; chunks are never
    /// silently omitted.
    pub async fn vectorize(
        &self,
        document: &str,
    ) -> Result<VectorizationResult, DocumentVectorizationFailed> {
        let chunks = self.chunker.split(document);
        if chunks.is_empty() {
            return Ok(VectorizationResult::default());
        }
        debug!(
            chunks = chunks.len(),
            workers = self.workers,
            "vectorizing document"
        );

        let mut slots: Vec<Option<Vec<f32>>> = Vec::new();
        slots.resize_with(chunks.len(), || None);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks: JoinSet<(usize, Result<Vec<f32>, EmbeddingUnavailable>)> = JoinSet::new();
        let mut failure: Option<(usize, EmbeddingUnavailable)> = None;

        for (index, chunk) in chunks.iter().enumerate() {
            // Harvest whatever finished so a failure stops dispatch promptly.
            while let Some(joined) = tasks.try_join_next() {
                record(joined, &mut slots, &mut failure);
            }
            if failure.is_some() {
                break;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("semaphore is never closed");

            // A task may have failed while we waited for the permit.
            while let Some(joined) = tasks.try_join_next() {
                record(joined, &mut slots, &mut failure);
            }
            if failure.is_some() {
                break;
            }

            let client = Arc::clone(&self.client);
            let text = chunk.content.clone();
            tasks.spawn(async move {
                let result = client.embed(&text).await;
                drop(permit);
                (index, result)
            });
        }

        // Cooperative drain: in-flight calls run to completion and their
        // results still count, but nothing new is dispatched.
        while let Some(joined) = tasks.join_next().await {
            record(joined, &mut slots, &mut failure);
        }

        if let Some((failed_index, source)) = failure {
            error!(
                failed_index,
                chunk_count = chunks.len(),
                "document vectorization failed"
            );
            let completed: Vec<(usize, Vec<f32>)> = slots
                .into_iter()
                .enumerate()
                .filter_map(|(index, slot)| slot.map(|vector| (index, vector)))
                .collect();
            return Err(DocumentVectorizationFailed {
                failed_index,
                chunk_count: chunks.len(),
                chunks,
                completed,
                source,
            });
        }

        let vectors: Vec<Vec<f32>> = slots
            .into_iter()
            .map(|slot| slot.expect("every chunk resolved without failure"))
            .collect();
        Ok(VectorizationResult { chunks, vectors })
    }
}

impl std::fmt::Debug for DocumentVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentVectorizer")
            .field("chunker", &self.chunker)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

fn record(
    joined: Result<(usize, Result<Vec<f32>, EmbeddingUnavailable>), JoinError>,
    slots: &mut [Option<Vec<f32>>],
    failure: &mut Option<(usize, EmbeddingUnavailable)>,
) {
    match joined {
        Ok((index, Ok(vector))) => slots[index] = Some(vector),
        Ok((index, Err(err))) => {
            // Keep the lowest failing index so the report is deterministic.
            if failure.as_ref().is_none_or(|(existing, _)| index < *existing) {
                *failure = Some((index, err));
            }
        }
        Err(join_err) => {
            if join_err.is_panic() {
                std::panic::resume_unwind(join_err.into_panic());
            }
        }
    }
}

/// Builder for [`DocumentVectorizer`] instances.
///
/// The endpoint is required; the token counter defaults to the crate's
/// default encoding (or the word-based counter without the `tiktoken`
/// feature) and the configuration to [`VectorizerConfig::default`].
#[derive(Default)]
pub struct DocumentVectorizerBuilder {
    config: VectorizerConfig,
    counter: Option<Arc<dyn TokenCounter>>,
    endpoint: Option<Arc<dyn InferenceEndpoint>>,
}

impl DocumentVectorizerBuilder {
    /// Set the full pipeline configuration.
    #[must_use]
    pub fn with_config(mut self, config: VectorizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the token counter shared by the chunker.
    #[must_use]
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Set the remote inference endpoint. Required.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Arc<dyn InferenceEndpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Build the vectorizer, validating all configuration up front.
    ///
    /// # Panics
    ///
    /// Panics if [`with_endpoint`](Self::with_endpoint) was not called.
    pub fn build(self) -> Result<DocumentVectorizer, ConfigError> {
        let endpoint = self
            .endpoint
            .expect("DocumentVectorizerBuilder requires an endpoint");

        self.config.validate()?;

        let counter = match self.counter {
            Some(counter) => counter,
            None => default_counter()?,
        };

        let chunker = RecursiveChunker::new(self.config.chunker, counter)?;
        let client = Arc::new(EmbeddingClient::new(endpoint, self.config.retry)?);

        Ok(DocumentVectorizer {
            chunker,
            client,
            workers: self.config.workers,
        })
    }
}

#[cfg(feature = "tiktoken")]
fn default_counter() -> Result<Arc<dyn TokenCounter>, ConfigError> {
    Ok(Arc::new(TiktokenCounter::new()?))
}

#[cfg(not(feature = "tiktoken"))]
fn default_counter() -> Result<Arc<dyn TokenCounter>, ConfigError> {
    Ok(Arc::new(WordCounter))
}
