//! # Inverted Index Module
//!
//! ## Purpose
//! Builds immutable inverted-index snapshots over a KB article corpus:
//! normalized term -> postings with per-field term frequencies, plus the
//! corpus statistics the relevance scorer needs.
//!
//! ## Input/Output Specification
//! - **Input**: One corpus snapshot (articles + version marker)
//! - **Output**: Immutable `IndexSnapshot` with sorted postings and per-field
//!   document lengths
//! - **Guarantees**: Build is pure and order-independent; the same article
//!   set yields identical postings regardless of supply order
//!
//! ## Key Features
//! - Postings keyed by article id, merged via commutative accumulation
//! - Per-term document frequency derived from postings length
//! - Duplicate article ids rejected as a corrupt corpus snapshot
//! - First-occurrence offsets retained per field for snippet extraction

use crate::errors::{Result, SearchError};
use crate::tokenizer::{Field, Tokenizer};
use crate::{Article, ArticleId};
use std::collections::BTreeMap;

/// One entry in a term's postings list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// Article containing the term
    pub article_id: ArticleId,
    /// Occurrences of the term in the article title
    pub title_tf: u32,
    /// Occurrences of the term in the article body
    pub body_tf: u32,
    /// Byte offset of the first title occurrence
    pub first_title_offset: Option<usize>,
    /// Byte offset of the first body occurrence
    pub first_body_offset: Option<usize>,
}

/// Token counts per field for one article, used for length normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldLengths {
    pub title_tokens: u32,
    pub body_tokens: u32,
}

/// Immutable index snapshot built from exactly one corpus snapshot.
///
/// Safe to share across concurrent readers without coordination; a corpus
/// change produces a brand-new snapshot rather than patching this one.
#[derive(Debug)]
pub struct IndexSnapshot {
    version: u64,
    postings: BTreeMap<String, Vec<Posting>>,
    articles: BTreeMap<ArticleId, Article>,
    lengths: BTreeMap<ArticleId, FieldLengths>,
}

impl IndexSnapshot {
    /// Corpus version marker this snapshot was built from
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of indexed articles
    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    /// Postings for a term, sorted by article id
    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    /// Number of articles containing the term
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, Vec::len)
    }

    /// Look up an indexed article by id
    pub fn article(&self, id: &str) -> Option<&Article> {
        self.articles.get(id)
    }

    /// Per-field token counts for an article
    pub fn field_lengths(&self, id: &str) -> FieldLengths {
        self.lengths.get(id).copied().unwrap_or_default()
    }

    /// Iterate all indexed articles in id order
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }
}

/// Builds index snapshots from article corpora
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    tokenizer: Tokenizer,
}

impl IndexBuilder {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Build an index snapshot from `articles`, stamped with `version`.
    ///
    /// Fails with `IndexBuild` if two articles share an id: a duplicate
    /// indicates a corrupt corpus snapshot, and silently overwriting one of
    /// the two would hide it.
    pub fn build(&self, articles: &[Article], version: u64) -> Result<IndexSnapshot> {
        let mut article_map: BTreeMap<ArticleId, Article> = BTreeMap::new();
        for article in articles {
            if article_map
                .insert(article.id.clone(), article.clone())
                .is_some()
            {
                return Err(SearchError::IndexBuild {
                    reason: format!("duplicate article id '{}' in corpus snapshot", article.id),
                });
            }
        }

        let mut postings: BTreeMap<String, BTreeMap<ArticleId, Posting>> = BTreeMap::new();
        let mut lengths: BTreeMap<ArticleId, FieldLengths> = BTreeMap::new();

        for (id, article) in &article_map {
            let title_tokens = self.tokenizer.tokenize(&article.title, Field::Title);
            let body_tokens = self.tokenizer.tokenize(&article.body, Field::Body);

            lengths.insert(
                id.clone(),
                FieldLengths {
                    title_tokens: title_tokens.len() as u32,
                    body_tokens: body_tokens.len() as u32,
                },
            );

            for token in title_tokens.iter().chain(body_tokens.iter()) {
                let posting = postings
                    .entry(token.term.clone())
                    .or_default()
                    .entry(id.clone())
                    .or_insert_with(|| Posting {
                        article_id: id.clone(),
                        title_tf: 0,
                        body_tf: 0,
                        first_title_offset: None,
                        first_body_offset: None,
                    });

                match token.field {
                    Field::Title => {
                        posting.title_tf += 1;
                        if posting.first_title_offset.is_none() {
                            posting.first_title_offset = Some(token.offset);
                        }
                    }
                    Field::Body => {
                        posting.body_tf += 1;
                        if posting.first_body_offset.is_none() {
                            posting.first_body_offset = Some(token.offset);
                        }
                    }
                }
            }
        }

        // BTreeMap keying means the per-term lists come out sorted by
        // article id, independent of the order articles were supplied in.
        let postings: BTreeMap<String, Vec<Posting>> = postings
            .into_iter()
            .map(|(term, by_article)| (term, by_article.into_values().collect()))
            .collect();

        tracing::debug!(
            "Built index snapshot v{} with {} articles, {} terms",
            version,
            article_map.len(),
            postings.len()
        );

        Ok(IndexSnapshot {
            version,
            postings,
            articles: article_map,
            lengths,
        })
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(Tokenizer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;
    use chrono::{TimeZone, Utc};

    fn article(id: &str, title: &str, body: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            category: Category::Account,
            tags: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn build_counts_per_field_frequencies() {
        let builder = IndexBuilder::default();
        let articles = vec![article(
            "KB-1",
            "Password Reset",
            "Reset your password. The password must be new.",
        )];
        let index = builder.build(&articles, 1).unwrap();

        let postings = index.postings("password").unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].title_tf, 1);
        assert_eq!(postings[0].body_tf, 2);
        assert_eq!(postings[0].first_title_offset, Some(0));
        assert_eq!(index.document_frequency("password"), 1);
    }

    #[test]
    fn build_is_order_independent() {
        let builder = IndexBuilder::default();
        let a = article("KB-1", "VPN timeout", "The VPN drops after a timeout.");
        let b = article("KB-2", "Email bounce", "Messages bounce with an error.");
        let c = article("KB-3", "VPN setup", "Install the VPN client first.");

        let forward = builder
            .build(&[a.clone(), b.clone(), c.clone()], 7)
            .unwrap();
        let shuffled = builder.build(&[c, a, b], 7).unwrap();

        assert_eq!(forward.postings, shuffled.postings);
        assert_eq!(forward.lengths, shuffled.lengths);
    }

    #[test]
    fn postings_are_sorted_by_article_id() {
        let builder = IndexBuilder::default();
        let articles = vec![
            article("KB-9", "VPN", "vpn"),
            article("KB-1", "VPN", "vpn"),
            article("KB-5", "VPN", "vpn"),
        ];
        let index = builder.build(&articles, 1).unwrap();
        let ids: Vec<&str> = index
            .postings("vpn")
            .unwrap()
            .iter()
            .map(|p| p.article_id.as_str())
            .collect();
        assert_eq!(ids, vec!["KB-1", "KB-5", "KB-9"]);
    }

    #[test]
    fn duplicate_article_id_fails_the_whole_build() {
        let builder = IndexBuilder::default();
        let articles = vec![
            article("KB-1", "First", "first body"),
            article("KB-1", "Second", "second body"),
        ];
        let err = builder.build(&articles, 1).unwrap_err();
        assert!(matches!(err, SearchError::IndexBuild { .. }));
        assert!(err.to_string().contains("KB-1"));
    }

    #[test]
    fn empty_corpus_builds_an_empty_snapshot() {
        let builder = IndexBuilder::default();
        let index = builder.build(&[], 3).unwrap();
        assert_eq!(index.article_count(), 0);
        assert_eq!(index.version(), 3);
        assert_eq!(index.document_frequency("anything"), 0);
    }
}
