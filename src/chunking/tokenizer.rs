//! Token counting behind a pluggable trait.
//!
//! The chunker measures size in tokens, not characters, so the counter must
//! match the embedding model's tokenizer for the budget to mean anything.
//! [`TiktokenCounter`] covers the GPT-style BPE family; [`WordCounter`] is a
//! rough stand-in when no model tokenizer is available.

use unicode_segmentation::UnicodeSegmentation;

#[cfg(feature = "tiktoken")]
use crate::config::DEFAULT_ENCODING;
use crate::types::ConfigError;

/// Deterministic, pure token counting.
///
/// Implementations must be side-effect-free and safe for concurrent use: the
/// same counter instance is shared across chunking and any parallel callers.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// Counts tokens with a named `tiktoken` BPE encoding.
///
/// Special-token markers in the input are encoded as ordinary text rather
/// than rejected, so arbitrary documents never fail to count.
#[cfg(feature = "tiktoken")]
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
    encoding: String,
}

#[cfg(feature = "tiktoken")]
impl TiktokenCounter {
    /// Loads the default GPT-style 50k-vocabulary encoding (`p50k_base`).
    pub fn new() -> Result<Self, ConfigError> {
        Self::for_encoding(DEFAULT_ENCODING)
    }

    /// Loads a counter for a named encoding.
    ///
    /// Recognized names: `r50k_base`, `p50k_base`, `p50k_edit`,
    /// `cl100k_base`, `o200k_base`.
    pub fn for_encoding(encoding: &str) -> Result<Self, ConfigError> {
        let bpe = match encoding {
            "r50k_base" => tiktoken_rs::r50k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "p50k_edit" => tiktoken_rs::p50k_edit(),
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            other => return Err(ConfigError::UnknownEncoding(other.to_string())),
        }
        .map_err(|err| ConfigError::Tokenizer(err.to_string()))?;

        Ok(Self {
            bpe,
            encoding: encoding.to_string(),
        })
    }

    /// Name of the loaded encoding.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

#[cfg(feature = "tiktoken")]
impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

#[cfg(feature = "tiktoken")]
impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// Word-based approximation: one unicode word = one token.
///
/// Deterministic and dependency-free, which also makes it the counter of
/// choice in tests where exact BPE boundaries would only add noise.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.unicode_words().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_counter_splits_on_whitespace_and_punctuation() {
        assert_eq!(WordCounter.count_tokens("Hello world, this is a test!"), 6);
        assert_eq!(WordCounter.count_tokens(""), 0);
        assert_eq!(WordCounter.count_tokens("word1\tword2\nword3"), 3);
    }

    #[cfg(feature = "tiktoken")]
    #[test]
    fn tiktoken_counter_defaults_to_p50k() {
        let counter = TiktokenCounter::new().unwrap();
        assert_eq!(counter.encoding(), "p50k_base");
        assert!(counter.count_tokens("hello world") >= 2);
        assert_eq!(counter.count_tokens(""), 0);
    }

    #[cfg(feature = "tiktoken")]
    #[test]
    fn tiktoken_counter_is_deterministic() {
        let counter = TiktokenCounter::new().unwrap();
        let text = "The quick brown fox jumps over the lazy dog.";
        assert_eq!(counter.count_tokens(text), counter.count_tokens(text));
    }

    #[cfg(feature = "tiktoken")]
    #[test]
    fn unknown_encoding_rejected() {
        let err = TiktokenCounter::for_encoding("q99k_base").unwrap_err();
        assert_eq!(
            err,
            crate::types::ConfigError::UnknownEncoding("q99k_base".to_string())
        );
    }

    #[cfg(feature = "tiktoken")]
    #[test]
    fn special_token_markers_count_as_plain_text() {
        let counter = TiktokenCounter::new().unwrap();
        // encode_ordinary treats this as literal text instead of erroring.
        assert!(counter.count_tokens("before <|endoftext|> after") > 0);
    }
}
