//! Recursive, token-bounded document splitting.
//!
//! The chunker walks a priority-ordered separator list (paragraph break, line
//! break, single space, character fallback). Text is split on the first
//! separator that appears; any resulting piece still over the token budget is
//! re-split with the remaining separators. Small adjacent pieces are merged
//! back together greedily up to `chunk_size` tokens, and each emitted chunk
//! leaves up to `chunk_overlap` trailing tokens in the merge window to seed
//! the next chunk.
//!
//! The empty-string separator is the terminal strategy: it splits at grapheme
//! boundaries and guarantees progress, so pathological input (a single unit
//! larger than the whole budget) ends up as an oversized singleton chunk
//! instead of recursing forever.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::chunking::tokenizer::TokenCounter;
use crate::config::ChunkerConfig;
use crate::types::{Chunk, ConfigError};

/// A sub-split carrying its token count so each candidate piece is counted
/// exactly once during splitting and merging.
struct Piece {
    text: String,
    tokens: usize,
}

/// Token-bounded, overlap-aware recursive text splitter.
pub struct RecursiveChunker {
    config: ChunkerConfig,
    counter: Arc<dyn TokenCounter>,
}

impl RecursiveChunker {
    /// Builds a chunker, validating the configuration up front.
    ///
    /// A custom separator list missing the empty-string fallback gets it
    /// appended so termination is always guaranteed.
    pub fn new(
        config: ChunkerConfig,
        counter: Arc<dyn TokenCounter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut config = config;
        if config.separators.last().is_none_or(|sep| !sep.is_empty()) {
            config.separators.push(String::new());
        }
        Ok(Self { config, counter })
    }

    /// The validated configuration in effect.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Splits `text` into token-bounded chunks in document order.
    ///
    /// Empty input yields an empty sequence. Every chunk satisfies
    /// `token_count <= chunk_size` except an indivisible unit that alone
    /// exceeds the budget.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }
        let chunks = self.split_with(text, &self.config.separators);
        debug!(
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            chunk_overlap = self.config.chunk_overlap,
            "document split"
        );
        chunks
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<Chunk> {
        // First separator present in the text wins; the terminal empty
        // string always matches.
        let (index, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(sep.as_str()))
            .map(|(i, sep)| (i, sep.as_str()))
            .unwrap_or((separators.len() - 1, ""));
        let remaining = &separators[index + 1..];

        let splits = split_on(text, separator);

        let mut finals: Vec<Chunk> = Vec::new();
        let mut good: Vec<Piece> = Vec::new();

        for part in splits {
            let tokens = self.counter.count_tokens(&part);
            if tokens <= self.config.chunk_size {
                good.push(Piece { text: part, tokens });
                continue;
            }

            // Oversized piece: flush what we have, then either recurse with
            // the lower-priority separators or emit it as-is when none are
            // left to try.
            if !good.is_empty() {
                self.merge(&mut good, separator, &mut finals);
            }
            if remaining.is_empty() {
                debug!(tokens, "indivisible unit exceeds chunk_size; emitting oversized chunk");
                finals.push(Chunk::new(part, tokens));
            } else {
                finals.extend(self.split_with(&part, remaining));
            }
        }

        if !good.is_empty() {
            self.merge(&mut good, separator, &mut finals);
        }
        finals
    }

    /// Greedy token-packing merge with an overlap carry-over window.
    fn merge(&self, pieces: &mut Vec<Piece>, separator: &str, out: &mut Vec<Chunk>) {
        let chunk_size = self.config.chunk_size;
        let chunk_overlap = self.config.chunk_overlap;
        let sep_tokens = if separator.is_empty() {
            0
        } else {
            self.counter.count_tokens(separator)
        };

        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces.drain(..) {
            let joiner = if window.is_empty() { 0 } else { sep_tokens };
            if total + piece.tokens + joiner > chunk_size && !window.is_empty() {
                self.emit(&window, separator, out);

                // Step the window back until at most `chunk_overlap` tokens
                // remain (and the incoming piece fits again).
                while total > chunk_overlap
                    || (total + piece.tokens + if window.is_empty() { 0 } else { sep_tokens }
                        > chunk_size
                        && total > 0)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= front.tokens;
                    if !window.is_empty() {
                        total -= sep_tokens;
                    }
                }
            }
            if !window.is_empty() {
                total += sep_tokens;
            }
            total += piece.tokens;
            window.push_back(piece);
        }

        if !window.is_empty() {
            self.emit(&window, separator, out);
        }
    }

    fn emit(&self, window: &VecDeque<Piece>, separator: &str, out: &mut Vec<Chunk>) {
        let joined = window
            .iter()
            .map(|piece| piece.text.as_str())
            .collect::<Vec<_>>()
            .join(separator);
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            return;
        }
        let token_count = self.counter.count_tokens(trimmed);
        out.push(Chunk::new(trimmed, token_count));
    }
}

impl std::fmt::Debug for RecursiveChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveChunker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Splits on `separator`, dropping the separator itself and empty pieces.
/// The empty separator means grapheme-level splitting.
fn split_on(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        text.graphemes(true).map(str::to_string).collect()
    } else {
        text.split(separator)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }
}
