//! Sentence splitting functionality for semantic chunking
//!
//! This module splits text into sentence spans on a configurable delimiter
//! list while keeping code blocks and common abbreviations intact. Every span
//! records its byte offsets into the source, and no whitespace is discarded,
//! so the spans can be stitched back into the original text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Default sentence delimiters
pub const DEFAULT_DELIMITERS: [&str; 4] = [".", "!", "?", "\n"];

/// Default minimum number of characters per sentence
pub const DEFAULT_MIN_CHARACTERS_PER_SENTENCE: usize = 12;

/// Common abbreviations that should not trigger sentence boundaries
static ABBREVIATIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "Sr.", "Jr.", "vs.", "etc.", "e.g.", "i.e.", "Ph.D.",
        "M.D.", "U.S.", "U.K.", "Inc.", "Ltd.", "Corp.", "Co.",
    ]
});

/// Pattern for detecting code blocks in Markdown
static CODE_BLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```[\s\S]*?```|`[^`\n]+`").expect("Failed to compile code block pattern regex")
});

/// Where a matched delimiter ends up
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncludeDelim {
    /// Attach to the sentence it terminates
    #[default]
    Prev,
    /// Attach to the start of the following sentence
    Next,
    /// Drop it from both sentences
    None,
}

/// A sentence located in its source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceSpan {
    /// Sentence text
    pub text: String,
    /// Byte offset where the sentence starts
    pub start: usize,
    /// Byte offset where the sentence ends (exclusive)
    pub end: usize,
}

/// Delimiter-driven sentence splitter
///
/// Splitting works in three steps:
/// 1. Cut the text after (or before) every delimiter that is not inside a
///    code block or part of a known abbreviation.
/// 2. Combine pieces shorter than the minimum character count with the text
///    that follows them.
/// 3. Fold whitespace-only sentences into their neighbour so that no sentence
///    is blank.
///
/// With [`IncludeDelim::Prev`] or [`IncludeDelim::Next`] the span texts
/// concatenate back into the input. With [`IncludeDelim::None`] the dropped
/// delimiters are missing from the texts but still covered by the offsets.
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::splitter::SentenceSplitter;
///
/// let splitter = SentenceSplitter::default();
/// let text = "This is a sentence. This is another sentence.";
/// let spans = splitter.split(text);
///
/// assert_eq!(spans.len(), 2);
/// assert_eq!(spans[0].text, "This is a sentence.");
/// assert_eq!(spans[1].text, " This is another sentence.");
/// assert_eq!(&text[spans[1].start..spans[1].end], spans[1].text);
/// ```
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    delimiters: Vec<String>,
    include_delim: IncludeDelim,
    min_characters_per_sentence: usize,
    protect_code_blocks: bool,
    protect_abbreviations: bool,
}

impl SentenceSplitter {
    /// Creates a splitter with the default delimiters and the given minimum
    /// sentence length in characters
    pub fn new(min_characters_per_sentence: usize) -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.iter().map(|d| d.to_string()).collect(),
            include_delim: IncludeDelim::default(),
            min_characters_per_sentence,
            protect_code_blocks: true,
            protect_abbreviations: true,
        }
    }

    /// Replaces the delimiter list; empty delimiters are ignored
    pub fn with_delimiters<I, S>(mut self, delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut delimiters: Vec<String> = delimiters
            .into_iter()
            .map(Into::into)
            .filter(|d| !d.is_empty())
            .collect();
        // Longest first so "..." wins over "."
        delimiters.sort_by(|a, b| b.len().cmp(&a.len()));
        self.delimiters = delimiters;
        self
    }

    /// Sets where delimiters are attached
    pub fn with_include_delim(mut self, include_delim: IncludeDelim) -> Self {
        self.include_delim = include_delim;
        self
    }

    /// Enables or disables code block protection
    pub fn with_code_block_protection(mut self, enabled: bool) -> Self {
        self.protect_code_blocks = enabled;
        self
    }

    /// Enables or disables abbreviation protection
    pub fn with_abbreviation_protection(mut self, enabled: bool) -> Self {
        self.protect_abbreviations = enabled;
        self
    }

    /// Returns the minimum sentence length in characters
    pub fn min_characters_per_sentence(&self) -> usize {
        self.min_characters_per_sentence
    }

    /// Configured delimiters, longest first
    pub fn delimiters(&self) -> &[String] {
        &self.delimiters
    }

    /// Splits text into sentence spans
    ///
    /// Empty and whitespace-only input yields no spans.
    pub fn split(&self, text: &str) -> Vec<SentenceSpan> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let protected = self.protected_mask(text);
        let pieces = self.split_pieces(text, &protected);
        let sentences = self.combine_short_pieces(text, pieces);

        fold_blank_sentences(text, sentences)
            .into_iter()
            .map(|pieces| to_span(text, &pieces))
            .collect()
    }

    /// Splits text and returns only the sentence strings
    pub fn split_texts(&self, text: &str) -> Vec<String> {
        self.split(text).into_iter().map(|s| s.text).collect()
    }

    /// Marks the bytes where a delimiter must not be recognised
    fn protected_mask(&self, text: &str) -> Vec<bool> {
        let mut mask = vec![false; text.len()];

        if self.protect_code_blocks {
            for m in CODE_BLOCK_PATTERN.find_iter(text) {
                mask[m.range()].iter_mut().for_each(|b| *b = true);
            }
        }

        if self.protect_abbreviations {
            for abbr in ABBREVIATIONS.iter() {
                for (idx, _) in text.match_indices(abbr) {
                    let at_word_start = text[..idx]
                        .chars()
                        .next_back()
                        .map_or(true, |c| !c.is_alphanumeric());
                    if !at_word_start {
                        continue;
                    }
                    for (offset, ch) in abbr.char_indices() {
                        if ch == '.' {
                            mask[idx + offset] = true;
                        }
                    }
                }
            }
        }

        mask
    }

    fn delimiter_at(&self, text: &str, pos: usize) -> Option<usize> {
        self.delimiters
            .iter()
            .find(|d| text[pos..].starts_with(d.as_str()))
            .map(String::len)
    }

    fn split_pieces(&self, text: &str, protected: &[bool]) -> Vec<Range<usize>> {
        let mut pieces = Vec::new();
        let mut push = |range: Range<usize>| {
            if !range.is_empty() {
                pieces.push(range);
            }
        };

        let mut piece_start = 0;
        let mut pos = 0;

        while pos < text.len() {
            if !text.is_char_boundary(pos) || protected[pos] {
                pos += 1;
                continue;
            }

            let Some(len) = self.delimiter_at(text, pos) else {
                pos += 1;
                continue;
            };

            match self.include_delim {
                IncludeDelim::Prev => {
                    push(piece_start..pos + len);
                    piece_start = pos + len;
                }
                IncludeDelim::Next => {
                    push(piece_start..pos);
                    piece_start = pos;
                }
                IncludeDelim::None => {
                    push(piece_start..pos);
                    piece_start = pos + len;
                }
            }
            pos += len;
        }

        push(piece_start..text.len());
        pieces
    }

    fn combine_short_pieces(
        &self,
        text: &str,
        pieces: Vec<Range<usize>>,
    ) -> Vec<Vec<Range<usize>>> {
        let min = self.min_characters_per_sentence;
        let mut sentences = Vec::new();
        let mut current: Vec<Range<usize>> = Vec::new();
        let mut current_chars = 0;

        for piece in pieces {
            let chars = text[piece.clone()].chars().count();

            if chars < min {
                current.push(piece);
                current_chars += chars;
            } else if !current.is_empty() {
                current.push(piece);
                sentences.push(std::mem::take(&mut current));
                current_chars = 0;
            } else {
                sentences.push(vec![piece]);
            }

            if !current.is_empty() && current_chars >= min {
                sentences.push(std::mem::take(&mut current));
                current_chars = 0;
            }
        }

        if !current.is_empty() {
            sentences.push(current);
        }

        sentences
    }
}

impl Default for SentenceSplitter {
    /// Default delimiters, delimiters kept on the previous sentence, and a
    /// 12 character minimum
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CHARACTERS_PER_SENTENCE)
    }
}

fn is_blank(text: &str, pieces: &[Range<usize>]) -> bool {
    pieces.iter().all(|r| text[r.clone()].trim().is_empty())
}

/// Attaches blank sentences to the previous sentence, or to the first
/// non-blank one when they lead the text
fn fold_blank_sentences(
    text: &str,
    sentences: Vec<Vec<Range<usize>>>,
) -> Vec<Vec<Range<usize>>> {
    let mut folded: Vec<Vec<Range<usize>>> = Vec::with_capacity(sentences.len());
    let mut leading = Vec::new();

    for sentence in sentences {
        if is_blank(text, &sentence) {
            match folded.last_mut() {
                Some(previous) => previous.extend(sentence),
                None => leading.extend(sentence),
            }
        } else if leading.is_empty() {
            folded.push(sentence);
        } else {
            let mut combined = std::mem::take(&mut leading);
            combined.extend(sentence);
            folded.push(combined);
        }
    }

    folded
}

fn to_span(text: &str, pieces: &[Range<usize>]) -> SentenceSpan {
    let start = pieces.first().map_or(0, |r| r.start);
    let end = pieces.last().map_or(0, |r| r.end);
    SentenceSpan {
        text: pieces.iter().map(|r| &text[r.clone()]).collect(),
        start,
        end,
    }
}
