//! Token counting for chunk size limits

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Counts tokens in a piece of text
///
/// Chunk size limits are expressed in whatever unit the counter reports.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`
    fn count_tokens(&self, text: &str) -> usize;
}

/// Counts Unicode words (UAX #29 word boundaries, punctuation excluded)
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::tokenizer::{TokenCounter, WordTokenCounter};
///
/// assert_eq!(WordTokenCounter.count_tokens("The quick (\"brown\") fox."), 4);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenCounter;

impl TokenCounter for WordTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.unicode_words().count()
    }
}

/// Counts Unicode scalar values
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterTokenCounter;

impl TokenCounter for CharacterTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Token counter selection in configuration files
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenCounterKind {
    #[default]
    Word,
    Character,
}

impl TokenCounterKind {
    pub fn counter(self) -> Box<dyn TokenCounter> {
        match self {
            TokenCounterKind::Word => Box::new(WordTokenCounter),
            TokenCounterKind::Character => Box::new(CharacterTokenCounter),
        }
    }
}
