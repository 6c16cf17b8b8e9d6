//! Pipeline configuration.
//!
//! All knobs live in explicit structs handed over at construction time; the
//! crate keeps no process-wide mutable defaults. Each struct validates its own
//! contract via `validate()`, and [`VectorizerConfig::validate`] composes them
//! so a vectorizer can fail fast before any remote call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ConfigError;

/// Default tokenizer encoding: GPT-style 50k-vocabulary byte-pair encoding.
pub const DEFAULT_ENCODING: &str = "p50k_base";

/// Splitting parameters for the recursive chunker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum tokens per chunk, measured by the injected token counter.
    pub chunk_size: usize,
    /// Trailing tokens from one chunk repeated at the start of the next.
    pub chunk_overlap: usize,
    /// Split boundaries tried in priority order. The empty string is the
    /// terminal character-level fallback; it is appended automatically when a
    /// custom list omits it.
    pub separators: Vec<String>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            chunk_overlap: 20,
            separators: default_separators(),
        }
    }
}

/// Paragraph break, line break, single space, then character fallback.
pub fn default_separators() -> Vec<String> {
    vec![
        "\n\n".to_string(),
        "\n".to_string(),
        " ".to_string(),
        String::new(),
    ]
}

impl ChunkerConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    /// Checks the chunking parameter contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                chunk_overlap: self.chunk_overlap,
                chunk_size: self.chunk_size,
            });
        }
        Ok(())
    }
}

/// Retry policy for remote embedding calls.
///
/// The backoff is fixed: every failed attempt waits `retry_delay` before the
/// next one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per chunk before giving up.
    pub max_retries: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        Ok(())
    }
}

/// Full pipeline configuration for [`DocumentVectorizer`](crate::DocumentVectorizer).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    pub chunker: ChunkerConfig,
    pub retry: RetryConfig,
    /// Upper bound on concurrent embedding calls.
    pub workers: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            retry: RetryConfig::default(),
            workers: 4,
        }
    }
}

impl VectorizerConfig {
    #[must_use]
    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunker.validate()?;
        self.retry.validate()?;
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = VectorizerConfig::default();
        assert_eq!(config.chunker.chunk_size, 200);
        assert_eq!(config.chunker.chunk_overlap, 20);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.retry_delay, Duration::from_secs(1));
        assert_eq!(config.workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let config = ChunkerConfig::new(50, 50);
        assert_eq!(
            config.validate(),
            Err(ConfigError::OverlapTooLarge {
                chunk_overlap: 50,
                chunk_size: 50,
            })
        );

        let config = ChunkerConfig::new(50, 80);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OverlapTooLarge { .. })
        ));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        assert_eq!(
            ChunkerConfig::new(0, 0).validate(),
            Err(ConfigError::ZeroChunkSize)
        );
    }

    #[test]
    fn zero_retries_and_workers_rejected() {
        let config = VectorizerConfig::default()
            .with_retry(RetryConfig::new(0, Duration::from_millis(10)));
        assert_eq!(config.validate(), Err(ConfigError::ZeroRetries));

        let config = VectorizerConfig::default().with_workers(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroWorkers));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = VectorizerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: VectorizerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
