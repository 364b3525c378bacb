//! # Pattern Matcher Module
//!
//! ## Purpose
//! Evaluates support-ticket text against the configured set of trigger
//! patterns, producing confidence-ranked matches used to suggest causes and
//! solutions for incoming tickets. Operates independently of the article
//! index.
//!
//! ## Input/Output Specification
//! - **Input**: Raw ticket text plus a compiled pattern set
//! - **Output**: Matched patterns sorted by confidence (desc) then pattern id,
//!   capped to a configured top-K
//! - **Confidence**: Keyword triggers score `matched / total` distinct
//!   keywords in [0, 1]; regex triggers are binary
//!
//! ## Key Features
//! - Triggers compiled once at pattern-set load, never per request
//! - A trigger that fails to compile excludes only that pattern; the
//!   exclusion is reported as a warning, never a fatal error

use crate::config::MatcherConfig;
use crate::errors::{Result, SearchError};
use crate::tokenizer::Tokenizer;
use crate::{Pattern, PatternId, TriggerSpec};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// A pattern trigger compiled into its evaluatable form
#[derive(Debug, Clone)]
pub enum CompiledTrigger {
    /// Normalized distinct keywords
    Keywords(BTreeSet<String>),
    /// Precompiled regex evaluated against normalized ticket text
    Matcher(Regex),
}

/// A pattern paired with its compiled trigger
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub pattern: Pattern,
    pub trigger: CompiledTrigger,
}

/// The full pattern configuration after compilation.
///
/// Compiled once when the pattern set is loaded (or reloaded on signal);
/// `excluded_ids` records patterns whose triggers failed to compile so every
/// match response can report them.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
    excluded_ids: Vec<PatternId>,
}

impl PatternSet {
    /// Compile `patterns`, collecting compile failures instead of failing.
    ///
    /// One bad pattern must never block matching against the rest, so a
    /// failed trigger only lands its id in `excluded_ids`.
    pub fn compile(patterns: &[Pattern], tokenizer: &Tokenizer) -> Self {
        let mut compiled = Vec::with_capacity(patterns.len());
        let mut excluded_ids = Vec::new();

        for pattern in patterns {
            match compile_trigger(pattern, tokenizer) {
                Ok(trigger) => compiled.push(CompiledPattern {
                    pattern: pattern.clone(),
                    trigger,
                }),
                Err(e) => {
                    tracing::warn!("Excluding pattern from matching: {}", e);
                    excluded_ids.push(pattern.id.clone());
                }
            }
        }

        excluded_ids.sort();
        Self {
            patterns: compiled,
            excluded_ids,
        }
    }

    /// Patterns that survived compilation
    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Ids of patterns excluded due to trigger compile failure
    pub fn excluded_ids(&self) -> &[PatternId] {
        &self.excluded_ids
    }
}

fn compile_trigger(pattern: &Pattern, tokenizer: &Tokenizer) -> Result<CompiledTrigger> {
    match &pattern.trigger {
        TriggerSpec::Keywords { keywords } => {
            let normalized: BTreeSet<String> = keywords
                .iter()
                .map(|k| tokenizer.normalize_keyword(k))
                .filter(|k| !k.is_empty())
                .collect();
            if normalized.is_empty() {
                return Err(SearchError::PatternCompile {
                    pattern_id: pattern.id.clone(),
                    reason: "keyword trigger has no usable keywords".to_string(),
                });
            }
            Ok(CompiledTrigger::Keywords(normalized))
        }
        TriggerSpec::Matcher { pattern: source } => {
            Regex::new(source)
                .map(CompiledTrigger::Matcher)
                .map_err(|e| SearchError::PatternCompile {
                    pattern_id: pattern.id.clone(),
                    reason: e.to_string(),
                })
        }
    }
}

/// One pattern matched against a ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPattern {
    /// Id of the matched pattern
    pub pattern_id: PatternId,
    /// Match confidence in [0, 1]
    pub confidence: f64,
    /// Trigger keywords found in the ticket text (empty for regex triggers)
    pub matched_keywords: Vec<String>,
}

/// Evaluates ticket text against compiled pattern sets
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    config: MatcherConfig,
    tokenizer: Tokenizer,
}

impl PatternMatcher {
    pub fn new(config: MatcherConfig, tokenizer: Tokenizer) -> Self {
        Self { config, tokenizer }
    }

    /// Match `ticket_text` against every compiled pattern.
    ///
    /// Zero-confidence patterns are dropped; the rest are sorted by
    /// confidence descending with ties broken by pattern id, and capped to
    /// the configured maximum.
    pub fn match_text(&self, ticket_text: &str, set: &PatternSet) -> Vec<MatchedPattern> {
        let terms: HashSet<String> = self
            .tokenizer
            .distinct_terms(ticket_text)
            .into_iter()
            .collect();
        let normalized = self.tokenizer.normalize(ticket_text);

        let mut matches = Vec::new();
        for compiled in set.patterns() {
            match &compiled.trigger {
                CompiledTrigger::Keywords(keywords) => {
                    let matched: Vec<String> = keywords
                        .iter()
                        .filter(|k| terms.contains(*k))
                        .cloned()
                        .collect();
                    if matched.is_empty() {
                        continue;
                    }
                    let confidence =
                        (matched.len() as f64 / keywords.len() as f64).min(1.0);
                    matches.push(MatchedPattern {
                        pattern_id: compiled.pattern.id.clone(),
                        confidence,
                        matched_keywords: matched,
                    });
                }
                CompiledTrigger::Matcher(regex) => {
                    if regex.is_match(&normalized) {
                        matches.push(MatchedPattern {
                            pattern_id: compiled.pattern.id.clone(),
                            confidence: 1.0,
                            matched_keywords: Vec::new(),
                        });
                    }
                }
            }
        }

        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.pattern_id.cmp(&b.pattern_id))
        });
        matches.truncate(self.config.max_matches);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;

    fn keyword_pattern(id: &str, keywords: &[&str]) -> Pattern {
        Pattern {
            id: id.to_string(),
            trigger: TriggerSpec::Keywords {
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            },
            category: Category::Network,
            suggested_article_ids: Vec::new(),
        }
    }

    fn regex_pattern(id: &str, pattern: &str) -> Pattern {
        Pattern {
            id: id.to_string(),
            trigger: TriggerSpec::Matcher {
                pattern: pattern.to_string(),
            },
            category: Category::Network,
            suggested_article_ids: Vec::new(),
        }
    }

    fn matcher() -> PatternMatcher {
        PatternMatcher::new(MatcherConfig::default(), Tokenizer::default())
    }

    fn compile(patterns: &[Pattern]) -> PatternSet {
        PatternSet::compile(patterns, &Tokenizer::default())
    }

    #[test]
    fn full_keyword_coverage_gives_full_confidence() {
        let set = compile(&[keyword_pattern("PAT-1", &["vpn", "disconnect", "timeout"])]);
        let matches = matcher().match_text(
            "The VPN will disconnect after every timeout.",
            &set,
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].confidence, 1.0);
        assert_eq!(
            matches[0].matched_keywords,
            vec!["disconnect", "timeout", "vpn"]
        );
    }

    #[test]
    fn partial_keyword_coverage_scales_confidence() {
        let set = compile(&[keyword_pattern("PAT-1", &["vpn", "disconnect", "timeout"])]);
        let matches = matcher().match_text("My vpn is slow today.", &set);
        assert_eq!(matches.len(), 1);
        assert!((matches[0].confidence - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(matches[0].matched_keywords, vec!["vpn"]);
    }

    #[test]
    fn zero_confidence_patterns_are_dropped() {
        let set = compile(&[keyword_pattern("PAT-1", &["printer", "jam"])]);
        assert!(matcher()
            .match_text("email delivery is delayed", &set)
            .is_empty());
    }

    #[test]
    fn regex_triggers_are_binary() {
        let set = compile(&[regex_pattern("PAT-1", r"error\s+(code\s+)?5\d\d")]);
        let hit = matcher().match_text("Server replied with Error   Code 503", &set);
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].confidence, 1.0);
        assert!(hit[0].matched_keywords.is_empty());

        assert!(matcher()
            .match_text("Server replied with error code 404", &set)
            .is_empty());
    }

    #[test]
    fn invalid_trigger_excludes_only_that_pattern() {
        let set = compile(&[
            regex_pattern("PAT-BAD", r"([unclosed"),
            keyword_pattern("PAT-OK", &["password"]),
        ]);

        assert_eq!(set.excluded_ids(), ["PAT-BAD".to_string()]);
        let matches = matcher().match_text("forgot my password", &set);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pattern_id, "PAT-OK");
    }

    #[test]
    fn matches_sort_by_confidence_then_id_and_are_capped() {
        let mut patterns = vec![
            keyword_pattern("PAT-B", &["vpn"]),
            keyword_pattern("PAT-A", &["vpn"]),
            keyword_pattern("PAT-C", &["vpn", "dns"]),
        ];
        for i in 0..6 {
            patterns.push(keyword_pattern(&format!("PAT-X{i}"), &["vpn"]));
        }
        let set = compile(&patterns);

        let matches = matcher().match_text("vpn is down", &set);
        assert_eq!(matches.len(), MatcherConfig::default().max_matches);
        // Full-confidence singles first, ordered by id; the two-keyword
        // pattern at 0.5 confidence sorts below every 1.0 match.
        assert_eq!(matches[0].pattern_id, "PAT-A");
        assert_eq!(matches[1].pattern_id, "PAT-B");
        assert!(matches.iter().all(|m| m.pattern_id != "PAT-C"));
    }

    #[test]
    fn empty_keyword_trigger_is_excluded_at_compile() {
        let set = compile(&[keyword_pattern("PAT-EMPTY", &["", "  "])]);
        assert_eq!(set.excluded_ids(), ["PAT-EMPTY".to_string()]);
        assert!(set.patterns().is_empty());
    }
}
