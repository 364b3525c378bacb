//! # Relevance Scorer Module
//!
//! ## Purpose
//! Ranks KB articles against a tokenized query using TF-IDF over the inverted
//! index, with title matches weighted higher than body matches, an exact-title
//! bonus, hard category/tag filtering, and snippet extraction.
//!
//! ## Input/Output Specification
//! - **Input**: Query text, request filters, an index snapshot
//! - **Output**: Fully ranked results (scores, snippets); pagination is the
//!   caller's concern and happens after ranking
//! - **Ordering**: Score descending, then `updated_at` descending, then
//!   article id ascending, which is a total order
//!
//! ## Scoring Formula
//! For each distinct query term with document frequency `df` in a corpus of
//! `N` articles: `idf = ln(1 + N/df)`. Per field the contribution is
//! `field_weight * (tf / field_token_count) * idf`, summed over query terms.
//! `title_weight` (default 2.5) stays at least twice `body_weight`
//! (default 1.0); a verbatim occurrence of the normalized query in the title
//! adds `exact_title_bonus` (default 1.0) on top.

use crate::config::ScoringConfig;
use crate::index::IndexSnapshot;
use crate::tokenizer::Tokenizer;
use crate::utils::TextUtils;
use crate::{Article, ArticleId, Category};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Hard filters applied before scoring; articles that fail them are excluded
/// from the ranked list entirely rather than down-weighted.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Restrict results to one category
    pub category: Option<Category>,
    /// Every requested tag must be present on the article
    pub tags: Vec<String>,
}

/// One ranked search result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// The matched article
    pub article: Article,
    /// Non-negative relevance score
    pub score: f64,
    /// Short excerpt around the best match
    pub snippet: String,
}

/// Per-article scoring state accumulated across query terms
#[derive(Debug, Default)]
struct Accumulator {
    title_score: f64,
    body_score: f64,
    bonus: f64,
    first_title_offset: Option<usize>,
    first_body_offset: Option<usize>,
}

impl Accumulator {
    fn total(&self) -> f64 {
        self.title_score + self.body_score + self.bonus
    }
}

/// TF-IDF relevance scorer
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    config: ScoringConfig,
    tokenizer: Tokenizer,
}

impl RelevanceScorer {
    pub fn new(config: ScoringConfig, tokenizer: Tokenizer) -> Self {
        Self { config, tokenizer }
    }

    /// Rank all matching articles in `index` against `query`.
    ///
    /// Returns the complete ranked list; an empty index or a query with no
    /// matching article yields an empty list, never an error.
    pub fn rank(
        &self,
        query: &str,
        filters: &SearchFilters,
        index: &IndexSnapshot,
    ) -> Vec<SearchHit> {
        let query_terms = self.tokenizer.distinct_terms(query);
        let normalized_query = self.tokenizer.normalize(query);
        let article_count = index.article_count();

        // Keyed accumulation keeps iteration (and therefore equal-score
        // ordering input) deterministic.
        let mut scores: BTreeMap<ArticleId, Accumulator> = BTreeMap::new();

        for term in &query_terms {
            let Some(postings) = index.postings(term) else {
                continue;
            };
            let idf = (1.0 + article_count as f64 / postings.len() as f64).ln();

            for posting in postings {
                let Some(article) = index.article(&posting.article_id) else {
                    continue;
                };
                if !self.passes_filters(article, filters) {
                    continue;
                }

                let lengths = index.field_lengths(&posting.article_id);
                let acc = scores.entry(posting.article_id.clone()).or_default();

                if posting.title_tf > 0 && lengths.title_tokens > 0 {
                    let tf = f64::from(posting.title_tf) / f64::from(lengths.title_tokens);
                    acc.title_score += self.config.title_weight * tf * idf;
                    acc.first_title_offset =
                        min_offset(acc.first_title_offset, posting.first_title_offset);
                }
                if posting.body_tf > 0 && lengths.body_tokens > 0 {
                    let tf = f64::from(posting.body_tf) / f64::from(lengths.body_tokens);
                    acc.body_score += self.config.body_weight * tf * idf;
                    acc.first_body_offset =
                        min_offset(acc.first_body_offset, posting.first_body_offset);
                }
            }
        }

        // Exact-substring bonus on the title, applied over the filtered
        // corpus so a verbatim title hit surfaces even without term overlap.
        if !normalized_query.is_empty() {
            for article in index.articles() {
                if !self.passes_filters(article, filters) {
                    continue;
                }
                if self
                    .tokenizer
                    .normalize(&article.title)
                    .contains(&normalized_query)
                {
                    scores.entry(article.id.clone()).or_default().bonus +=
                        self.config.exact_title_bonus;
                }
            }
        }

        let mut hits: Vec<SearchHit> = scores
            .into_iter()
            .filter(|(_, acc)| acc.total() > 0.0)
            .filter_map(|(id, acc)| {
                index.article(&id).map(|article| SearchHit {
                    snippet: self.snippet(article, &acc),
                    score: acc.total(),
                    article: article.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.article.updated_at.cmp(&a.article.updated_at))
                .then_with(|| a.article.id.cmp(&b.article.id))
        });

        hits
    }

    fn passes_filters(&self, article: &Article, filters: &SearchFilters) -> bool {
        if let Some(category) = filters.category {
            if article.category != category {
                return false;
            }
        }
        filters.tags.iter().all(|wanted| {
            article
                .tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(wanted))
        })
    }

    /// Extract a bounded window around the first matched term in the
    /// top-scoring field; fall back to the opening of the body when no query
    /// term occurs literally.
    fn snippet(&self, article: &Article, acc: &Accumulator) -> String {
        let title_leads = acc.title_score + acc.bonus >= acc.body_score;
        let (text, offset) = if title_leads && acc.first_title_offset.is_some() {
            (article.title.as_str(), acc.first_title_offset)
        } else if acc.first_body_offset.is_some() {
            (article.body.as_str(), acc.first_body_offset)
        } else if acc.first_title_offset.is_some() {
            (article.title.as_str(), acc.first_title_offset)
        } else {
            return TextUtils::truncate(&article.body, self.config.snippet_fallback_length);
        };

        let offset = offset.unwrap_or(0);
        let radius = self.config.snippet_radius;
        let start = TextUtils::floor_char_boundary(text, offset.saturating_sub(radius));
        let end = TextUtils::ceil_char_boundary(text, (offset + radius).min(text.len()));

        let mut snippet = String::new();
        if start > 0 {
            snippet.push_str("...");
        }
        snippet.push_str(text[start..end].trim());
        if end < text.len() {
            snippet.push_str("...");
        }
        snippet
    }
}

fn min_offset(current: Option<usize>, candidate: Option<usize>) -> Option<usize> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn article(id: &str, title: &str, body: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            category: Category::Account,
            tags: Vec::new(),
            created_at: ts(1),
            updated_at: ts(2),
        }
    }

    fn scorer() -> RelevanceScorer {
        RelevanceScorer::new(ScoringConfig::default(), Tokenizer::default())
    }

    fn build(articles: &[Article]) -> IndexSnapshot {
        IndexBuilder::default().build(articles, 1).unwrap()
    }

    #[test]
    fn title_matches_outrank_body_matches() {
        let index = build(&[
            article(
                "KB-1",
                "Password Reset Steps",
                "Follow these steps to regain access to your account.",
            ),
            article(
                "KB-2",
                "Account Info",
                "You can reset your password from the profile page.",
            ),
        ]);

        let hits = scorer().rank("password reset", &SearchFilters::default(), &index);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].article.id, "KB-1");
        assert_eq!(hits[1].article.id, "KB-2");
    }

    #[test]
    fn scores_are_non_negative_and_sorted() {
        let index = build(&[
            article("KB-1", "VPN timeout", "The vpn connection times out."),
            article("KB-2", "VPN setup", "Install the vpn client."),
            article("KB-3", "Printer jam", "Clear the paper tray."),
        ]);

        let hits = scorer().rank("vpn timeout", &SearchFilters::default(), &index);
        assert!(!hits.is_empty());
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(hits.iter().all(|h| h.score >= 0.0));
    }

    #[test]
    fn ties_break_by_recency_then_id() {
        let mut older = article("KB-1", "VPN drops", "vpn drops constantly");
        older.updated_at = ts(5);
        let mut newer = article("KB-9", "VPN drops", "vpn drops constantly");
        newer.updated_at = ts(9);
        let mut same_as_older = article("KB-0", "VPN drops", "vpn drops constantly");
        same_as_older.updated_at = ts(5);

        let index = build(&[older, newer, same_as_older]);
        let hits = scorer().rank("vpn drops", &SearchFilters::default(), &index);
        let ids: Vec<&str> = hits.iter().map(|h| h.article.id.as_str()).collect();
        assert_eq!(ids, vec!["KB-9", "KB-0", "KB-1"]);
    }

    #[test]
    fn category_filter_is_hard() {
        let mut network = article("KB-1", "VPN timeout", "vpn timeout details");
        network.category = Category::Network;
        let mut software = article("KB-2", "VPN timeout", "vpn timeout details");
        software.category = Category::Software;

        let index = build(&[network, software]);
        let filters = SearchFilters {
            category: Some(Category::Network),
            tags: Vec::new(),
        };
        let hits = scorer().rank("vpn", &filters, &index);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].article.id, "KB-1");
    }

    #[test]
    fn all_requested_tags_must_be_present() {
        let mut tagged = article("KB-1", "Mail bounce", "bounce details");
        tagged.tags = vec!["email".to_string(), "smtp".to_string()];
        let mut partial = article("KB-2", "Mail bounce", "bounce details");
        partial.tags = vec!["email".to_string()];

        let index = build(&[tagged, partial]);
        let filters = SearchFilters {
            category: None,
            tags: vec!["Email".to_string(), "SMTP".to_string()],
        };
        let hits = scorer().rank("bounce", &filters, &index);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].article.id, "KB-1");
    }

    #[test]
    fn empty_index_returns_empty_results() {
        let index = build(&[]);
        assert!(scorer()
            .rank("anything", &SearchFilters::default(), &index)
            .is_empty());
    }

    #[test]
    fn snippet_windows_around_the_first_match() {
        let filler = "troubleshooting guidance continues here ".repeat(10);
        let body = format!("{filler}the certificate expired yesterday. {filler}");
        let index = build(&[article("KB-1", "TLS errors", &body)]);

        let hits = scorer().rank("certificate", &SearchFilters::default(), &index);
        assert_eq!(hits.len(), 1);
        let snippet = &hits[0].snippet;
        assert!(snippet.contains("certificate"));
        assert!(snippet.starts_with("..."));
        assert!(snippet.ends_with("..."));
        assert!(snippet.len() < body.len());
    }

    #[test]
    fn stopword_only_query_with_title_hit_falls_back_to_body_prefix() {
        let index = build(&[article(
            "KB-1",
            "What to do when the printer is offline",
            "Open the printer settings panel and re-enable the spooler service.",
        )]);

        // Every query term is a stop-word, so only the exact-substring bonus
        // fires and no literal term offset exists.
        let hits = scorer().rank("when the", &SearchFilters::default(), &index);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].snippet.starts_with("Open the printer"));
    }

    #[test]
    fn exact_title_bonus_prefers_verbatim_titles() {
        let index = build(&[
            article(
                "KB-1",
                "Reset two-factor authentication",
                "Steps for authenticator apps.",
            ),
            article(
                "KB-2",
                "Two-factor reset authentication notes",
                "Steps for authenticator apps.",
            ),
        ]);

        let hits = scorer().rank(
            "reset two-factor authentication",
            &SearchFilters::default(),
            &index,
        );
        assert_eq!(hits[0].article.id, "KB-1");
        assert!(hits[0].score > hits[1].score);
    }
}
