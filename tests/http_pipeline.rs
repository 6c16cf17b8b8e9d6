//! End-to-end pipeline tests against a mock HTTP embedding endpoint.
//!
//! These exercise the real `HttpEndpoint` transport (headers, payloads,
//! retries, timeouts) rather than the in-process mock, so the wire contract
//! stays covered.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use docvex::{
    AttemptError, ChunkerConfig, DocumentVectorizer, HttpEndpoint, RetryConfig, VectorizerConfig,
    WordCounter,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .try_init();
}

fn endpoint_for(server: &MockServer) -> Arc<HttpEndpoint> {
    let url = Url::parse(&server.url("/embed")).unwrap();
    Arc::new(HttpEndpoint::new(url))
}

fn word_vectorizer(
    endpoint: Arc<HttpEndpoint>,
    chunk_size: usize,
    max_retries: u32,
) -> DocumentVectorizer {
    let config = VectorizerConfig::default()
        .with_chunker(ChunkerConfig::new(chunk_size, 0))
        .with_retry(RetryConfig::new(max_retries, Duration::from_millis(5)))
        .with_workers(2);
    DocumentVectorizer::builder()
        .with_config(config)
        .with_token_counter(Arc::new(WordCounter))
        .with_endpoint(endpoint)
        .build()
        .unwrap()
}

#[tokio::test]
async fn document_with_three_chunks_yields_three_vectors() {
    init_tracing();
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200)
                .json_body(json!({ "embedding": [[0.1, 0.2, 0.3]] }));
        })
        .await;

    let vectorizer = word_vectorizer(endpoint_for(&server), 4, 3);
    let document = "one two three four\n\nfive six seven eight\n\nnine ten eleven twelve";

    let result = vectorizer.vectorize(document).await.unwrap();

    assert_eq!(result.len(), 3);
    for vector in &result.vectors {
        assert_eq!(vector, &vec![0.1, 0.2, 0.3]);
    }
    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn request_carries_text_payload_and_headers() {
    let server = MockServer::start_async().await;
    // Matches only the exact payload and header set the models expect.
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embed")
                .header("content-type", "application/x-text")
                .header("accept", "application/json")
                .body("tiny document");
            then.status(200).json_body(json!({ "embedding": [[1.0]] }));
        })
        .await;

    let vectorizer = word_vectorizer(endpoint_for(&server), 50, 1);
    let result = vectorizer.vectorize("tiny document").await.unwrap();

    assert_eq!(result.vectors, vec![vec![1.0]]);
    mock.assert_async().await;
}

#[tokio::test]
async fn server_errors_burn_the_retry_budget_then_fail() {
    init_tracing();
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(500).body("upstream exploded");
        })
        .await;

    let vectorizer = word_vectorizer(endpoint_for(&server), 50, 3);
    let err = vectorizer.vectorize("a single small chunk").await.unwrap_err();

    assert_eq!(err.failed_index, 0);
    assert_eq!(err.chunk_count, 1);
    assert_eq!(err.source.attempts, 3);
    assert!(matches!(err.source.source, AttemptError::Transport(_)));
    assert!(err.completed.is_empty());
    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn malformed_body_is_reported_distinctly() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200).body("<html>definitely not json</html>");
        })
        .await;

    let vectorizer = word_vectorizer(endpoint_for(&server), 50, 2);
    let err = vectorizer.vectorize("another small chunk").await.unwrap_err();

    assert!(matches!(
        err.source.source,
        AttemptError::MalformedResponse(_)
    ));
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn missing_embedding_field_counts_as_malformed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200).json_body(json!({ "vectors": [[0.5]] }));
        })
        .await;

    let vectorizer = word_vectorizer(endpoint_for(&server), 50, 1);
    let err = vectorizer.vectorize("some words here").await.unwrap_err();

    assert!(matches!(
        err.source.source,
        AttemptError::MalformedResponse(_)
    ));
}

#[tokio::test]
async fn call_timeout_is_a_transport_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200)
                .json_body(json!({ "embedding": [[1.0]] }))
                .delay(Duration::from_millis(500));
        })
        .await;

    let url = Url::parse(&server.url("/embed")).unwrap();
    let endpoint = Arc::new(HttpEndpoint::new(url).with_timeout(Duration::from_millis(50)));
    let vectorizer = word_vectorizer(endpoint, 50, 1);

    let err = vectorizer.vectorize("slow endpoint chunk").await.unwrap_err();
    assert!(matches!(err.source.source, AttemptError::Transport(_)));
}

#[tokio::test]
async fn larger_document_keeps_alignment_over_http() {
    init_tracing();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200)
                .json_body(json!({ "embedding": [[0.25, 0.75]] }));
        })
        .await;

    let paragraphs: Vec<String> = (0..12)
        .map(|i| format!("paragraph {i} talks about topic {i} in a few words"))
        .collect();
    let document = paragraphs.join("\n\n");

    let vectorizer = word_vectorizer(endpoint_for(&server), 10, 2);
    let result = vectorizer.vectorize(&document).await.unwrap();

    assert!(result.len() >= 12, "each paragraph should chunk separately");
    assert_eq!(result.chunks.len(), result.vectors.len());
    for (chunk, vector) in result.pairs() {
        assert!(!chunk.content.is_empty());
        assert_eq!(vector, &[0.25, 0.75]);
    }
}
