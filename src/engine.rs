//! # Search Orchestrator Module
//!
//! ## Purpose
//! Public entry point of the engine. Validates requests, resolves the current
//! index snapshot (rebuilding lazily when the corpus changed), drives the
//! scorer for search and the matcher for ticket matching, and shapes the
//! response DTOs consumed by the HTTP layer.
//!
//! ## Input/Output Specification
//! - **Input**: `SearchRequest` / `PatternMatchRequest` DTOs
//! - **Output**: `SearchResponse` / `PatternMatchResponse` DTOs
//! - **Guarantees**: Never serves a partially built index; never mutates
//!   article or pattern state
//!
//! ## Key Features
//! - Lazy, memoized index rebuild: at most one build per corpus change, with
//!   a double-checked write lock so concurrent stale readers don't race
//! - Atomic snapshot swap; in-flight requests finish on the old snapshot
//! - Fallback to the last good snapshot when a rebuild fails
//! - Explicit pattern reload signal

use crate::config::Config;
use crate::errors::{Result, SearchError};
use crate::index::{IndexBuilder, IndexSnapshot};
use crate::matcher::{MatchedPattern, PatternMatcher, PatternSet};
use crate::repository::{ArticleRepository, PatternRepository};
use crate::scorer::{RelevanceScorer, SearchFilters, SearchHit};
use crate::tokenizer::Tokenizer;
use crate::Category;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Search request DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchRequest {
    /// Free-text query; must be non-empty after trimming
    pub query: String,
    /// Optional hard category filter
    #[serde(default)]
    pub category: Option<Category>,
    /// Optional hard tag filter; every tag must be present
    #[serde(default)]
    pub tags: Vec<String>,
    /// Page size; must be greater than zero when given
    #[serde(default)]
    pub limit: Option<usize>,
    /// Offset into the full ranked list
    #[serde(default)]
    pub offset: Option<usize>,
}

impl SearchRequest {
    /// Convenience constructor for a bare query
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            tags: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

/// Search response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// One page of ranked results
    pub results: Vec<SearchHit>,
    /// Size of the full ranked list before pagination
    pub total: usize,
    /// Echo of the normalized query
    pub query: String,
}

/// Ticket pattern-match request DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatternMatchRequest {
    /// Ticket identifier echoed back in the response
    pub ticket_id: String,
    /// Raw ticket text to match against the pattern set
    pub ticket_text: String,
}

/// Ticket pattern-match response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatchResponse {
    pub ticket_id: String,
    /// Matched patterns, descending by confidence
    pub matches: Vec<MatchedPattern>,
    /// Patterns skipped because their trigger failed to compile
    pub excluded_pattern_ids: Vec<String>,
}

/// Engine statistics for monitoring endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub indexed_articles: usize,
    pub index_version: u64,
    pub active_patterns: usize,
    pub excluded_patterns: usize,
}

/// Search orchestrator: the only component the HTTP layer calls
pub struct SearchService {
    articles: Arc<dyn ArticleRepository>,
    patterns: Arc<dyn PatternRepository>,
    tokenizer: Tokenizer,
    builder: IndexBuilder,
    scorer: RelevanceScorer,
    matcher: PatternMatcher,
    default_limit: usize,
    index: RwLock<Option<Arc<IndexSnapshot>>>,
    pattern_set: RwLock<Arc<PatternSet>>,
}

impl SearchService {
    /// Create the service and compile the initial pattern set.
    ///
    /// The index itself is built lazily on the first request so that startup
    /// does not depend on corpus health.
    pub async fn new(
        config: Arc<Config>,
        articles: Arc<dyn ArticleRepository>,
        patterns: Arc<dyn PatternRepository>,
    ) -> Result<Self> {
        let tokenizer = Tokenizer::new(&config.tokenizer);
        let loaded = patterns.current_patterns().await?;
        let pattern_set = PatternSet::compile(&loaded, &tokenizer);
        tracing::info!(
            "Compiled {} patterns ({} excluded)",
            pattern_set.patterns().len(),
            pattern_set.excluded_ids().len()
        );

        Ok(Self {
            articles,
            patterns,
            builder: IndexBuilder::new(tokenizer.clone()),
            scorer: RelevanceScorer::new(config.scoring.clone(), tokenizer.clone()),
            matcher: PatternMatcher::new(config.matcher.clone(), tokenizer.clone()),
            default_limit: config.scoring.default_limit,
            tokenizer,
            index: RwLock::new(None),
            pattern_set: RwLock::new(Arc::new(pattern_set)),
        })
    }

    /// Execute a KB search request
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        if request.query.trim().is_empty() {
            return Err(SearchError::validation("query", "Query must not be empty"));
        }
        if request.limit == Some(0) {
            return Err(SearchError::validation(
                "limit",
                "Limit must be greater than zero",
            ));
        }

        let index = self.current_index().await?;
        let filters = SearchFilters {
            category: request.category,
            tags: request.tags.clone(),
        };

        let ranked = self.scorer.rank(&request.query, &filters, &index);
        let total = ranked.len();

        // Pagination happens strictly after the full ranked list exists, so
        // limit/offset can never change which articles rank where.
        let offset = request.offset.unwrap_or(0);
        let limit = request.limit.unwrap_or(self.default_limit);
        let results: Vec<SearchHit> = ranked.into_iter().skip(offset).take(limit).collect();

        tracing::debug!(
            "Search '{}' matched {} articles (returning {})",
            request.query,
            total,
            results.len()
        );

        Ok(SearchResponse {
            results,
            total,
            query: self.tokenizer.normalize(&request.query),
        })
    }

    /// Match a support ticket against the configured trigger patterns
    pub async fn match_ticket(&self, request: PatternMatchRequest) -> Result<PatternMatchResponse> {
        if request.ticket_id.trim().is_empty() {
            return Err(SearchError::validation(
                "ticketId",
                "Ticket id must not be empty",
            ));
        }
        if request.ticket_text.trim().is_empty() {
            return Err(SearchError::validation(
                "ticketText",
                "Ticket text must not be empty",
            ));
        }

        let set = self.pattern_set.read().await.clone();
        let matches = self.matcher.match_text(&request.ticket_text, &set);

        tracing::debug!(
            "Ticket '{}' matched {} patterns",
            request.ticket_id,
            matches.len()
        );

        Ok(PatternMatchResponse {
            ticket_id: request.ticket_id,
            matches,
            excluded_pattern_ids: set.excluded_ids().to_vec(),
        })
    }

    /// Recompile the pattern set from the repository.
    ///
    /// Returns the number of active patterns after the reload.
    pub async fn reload_patterns(&self) -> Result<usize> {
        let loaded = self.patterns.current_patterns().await?;
        let compiled = PatternSet::compile(&loaded, &self.tokenizer);
        let active = compiled.patterns().len();
        tracing::info!(
            "Reloaded pattern set: {} active, {} excluded",
            active,
            compiled.excluded_ids().len()
        );
        *self.pattern_set.write().await = Arc::new(compiled);
        Ok(active)
    }

    /// Verify the repositories respond and an index snapshot can be resolved
    pub async fn health_check(&self) -> Result<()> {
        self.current_index().await?;
        self.patterns.current_patterns().await?;
        Ok(())
    }

    /// Engine statistics for the monitoring endpoint
    pub async fn stats(&self) -> Result<ServiceStats> {
        let index = self.current_index().await?;
        let set = self.pattern_set.read().await.clone();
        Ok(ServiceStats {
            indexed_articles: index.article_count(),
            index_version: index.version(),
            active_patterns: set.patterns().len(),
            excluded_patterns: set.excluded_ids().len(),
        })
    }

    /// Resolve the index snapshot for the current corpus version.
    ///
    /// Fast path: the cached snapshot matches the repository's version
    /// marker. Slow path: take the write lock, re-check (another request may
    /// have rebuilt while we waited), and build once. A failed build falls
    /// back to the previous good snapshot when one exists.
    async fn current_index(&self) -> Result<Arc<IndexSnapshot>> {
        let snapshot = self.articles.current_snapshot().await?;

        {
            let cached = self.index.read().await;
            if let Some(index) = cached.as_ref() {
                if index.version() == snapshot.version {
                    return Ok(index.clone());
                }
            }
        }

        let mut cached = self.index.write().await;
        if let Some(index) = cached.as_ref() {
            if index.version() == snapshot.version {
                return Ok(index.clone());
            }
        }

        match self.builder.build(&snapshot.articles, snapshot.version) {
            Ok(index) => {
                let index = Arc::new(index);
                tracing::info!(
                    "Index rebuilt: version {}, {} articles",
                    index.version(),
                    index.article_count()
                );
                *cached = Some(index.clone());
                Ok(index)
            }
            Err(e) => match cached.as_ref() {
                Some(previous) => {
                    tracing::warn!(
                        "Index rebuild for version {} failed ({}); serving previous snapshot v{}",
                        snapshot.version,
                        e,
                        previous.version()
                    );
                    Ok(previous.clone())
                }
                None => {
                    tracing::error!("Initial index build failed: {}", e);
                    Err(SearchError::internal("Search index is unavailable"))
                }
            },
        }
    }
}
