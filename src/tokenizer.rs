//! # Tokenizer Module
//!
//! ## Purpose
//! Text normalization and term extraction shared by indexing, query scoring,
//! and pattern matching, so that all three compare terms produced by exactly
//! the same rules.
//!
//! ## Input/Output Specification
//! - **Input**: Raw article/query/ticket text
//! - **Output**: Lowercased, NFC-normalized terms with byte offsets and field
//!   tags
//! - **Guarantees**: Deterministic and side-effect-free; identical input
//!   always yields an identical token sequence
//!
//! ## Key Features
//! - Unicode NFC normalization and case folding
//! - Punctuation stripping via alphanumeric-run splitting
//! - Stop-word filtering with support-ticket context
//! - Minimum-length filtering for noise terms

use crate::config::TokenizerConfig;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Which article field a token was extracted from.
///
/// Title and body are tokenized with the same rules but tracked separately so
/// the scorer can weight them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Body,
}

/// A single extracted term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Normalized term text
    pub term: String,
    /// Byte offset of the term in the original input text
    pub offset: usize,
    /// Field the term was extracted from
    pub field: Field,
}

/// Common English stop-words plus greetings and filler that dominate support
/// tickets without carrying signal.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "for",
    "from", "had", "has", "have", "he", "her", "hi", "hello", "him", "his",
    "how", "if", "in", "into", "is", "it", "its", "me", "my", "no", "not",
    "of", "on", "or", "our", "out", "please", "regards", "she", "so", "some",
    "than", "thanks", "that", "the", "their", "them", "then", "these", "they",
    "this", "to", "up", "was", "we", "what", "when", "which", "who", "will",
    "with", "would", "you", "your",
];

/// Deterministic text tokenizer
#[derive(Debug, Clone)]
pub struct Tokenizer {
    min_term_length: usize,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Create a tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let mut stopwords: HashSet<String> =
            STOPWORDS.iter().map(|w| (*w).to_string()).collect();
        for word in &config.extra_stopwords {
            stopwords.insert(word.to_lowercase());
        }

        Self {
            min_term_length: config.min_term_length,
            stopwords,
        }
    }

    /// Tokenize `text`, tagging every token with `field`.
    ///
    /// Splits on non-alphanumeric runs, lowercases, NFC-normalizes each term,
    /// and drops stop-words and terms shorter than the configured minimum.
    /// Offsets point into the original input so callers can excerpt around a
    /// match. Empty input yields an empty sequence.
    pub fn tokenize(&self, text: &str, field: Field) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut start: Option<usize> = None;
        let mut current = String::new();

        for (idx, ch) in text.char_indices() {
            if ch.is_alphanumeric() {
                if start.is_none() {
                    start = Some(idx);
                }
                for lowered in ch.to_lowercase() {
                    current.push(lowered);
                }
            } else if let Some(offset) = start.take() {
                self.push_token(&mut tokens, &current, offset, field);
                current.clear();
            }
        }

        if let Some(offset) = start {
            self.push_token(&mut tokens, &current, offset, field);
        }

        tokens
    }

    /// Tokenize a query or ticket text and return the distinct terms, sorted.
    ///
    /// Duplicated words in a query do not double-weight scoring, and the
    /// matcher intersects keyword sets against this set.
    pub fn distinct_terms(&self, text: &str) -> Vec<String> {
        let mut terms: Vec<String> = self
            .tokenize(text, Field::Body)
            .into_iter()
            .map(|t| t.term)
            .collect();
        terms.sort();
        terms.dedup();
        terms
    }

    /// Normalize a full string for substring comparison: NFC, lowercase, and
    /// whitespace collapsed to single spaces.
    pub fn normalize(&self, text: &str) -> String {
        let folded: String = text.nfc().flat_map(char::to_lowercase).collect();
        folded.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Normalize a single trigger keyword to its comparable term form
    pub fn normalize_keyword(&self, keyword: &str) -> String {
        keyword
            .nfc()
            .flat_map(char::to_lowercase)
            .filter(|c| c.is_alphanumeric())
            .collect()
    }

    fn push_token(&self, tokens: &mut Vec<Token>, raw: &str, offset: usize, field: Field) {
        let term: String = raw.nfc().collect();
        if term.chars().count() < self.min_term_length {
            return;
        }
        if self.stopwords.contains(&term) {
            return;
        }
        tokens.push(Token {
            term,
            offset,
            field,
        });
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}
