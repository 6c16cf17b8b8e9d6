//! Token-bounded document splitting.

pub mod splitter;
pub mod tokenizer;

pub use splitter::RecursiveChunker;
#[cfg(feature = "tiktoken")]
pub use tokenizer::TiktokenCounter;
pub use tokenizer::{TokenCounter, WordCounter};
