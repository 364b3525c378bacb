//! # Support-Ticket Knowledge-Base Search Engine
//!
//! ## Overview
//! This library implements the search-and-match subsystem for a support-ticket
//! knowledge base: given a corpus of KB articles and a free-text query (or a
//! raw ticket body), it returns ranked relevant articles and/or a ranked list
//! of matched trigger patterns with confidence scores.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `tokenizer`: Text normalization and term extraction
//! - `index`: Inverted index construction over article snapshots
//! - `scorer`: TF-IDF relevance ranking with field weighting and snippets
//! - `matcher`: Trigger-pattern evaluation against ticket text
//! - `engine`: Search orchestrator tying the components together
//! - `repository`: Article and pattern collaborator interfaces
//! - `api`: REST API endpoints
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: KB articles (JSON), search queries, support ticket text
//! - **Output**: Ranked search results with snippets, matched patterns with
//!   confidence scores
//! - **Performance**: Pure in-memory computation, deterministic results
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use kb_search::config::Config;
//! use kb_search::engine::{SearchRequest, SearchService};
//! use kb_search::repository::{InMemoryArticleRepository, InMemoryPatternRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let articles = Arc::new(InMemoryArticleRepository::new(Vec::new()));
//!     let patterns = Arc::new(InMemoryPatternRepository::new(Vec::new()));
//!     let service = SearchService::new(config, articles, patterns).await?;
//!     let response = service.search(SearchRequest::query("password reset")).await?;
//!     println!("Found {} results", response.total);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod tokenizer;
pub mod index;
pub mod scorer;
pub mod matcher;
pub mod repository;
pub mod engine;
pub mod api;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use engine::SearchService;
pub use errors::{Result, SearchError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unique identifier for KB articles, stable across corpus snapshots
/// (e.g. `"KB-1001"`). Tie-breaks order ids lexicographically ascending.
pub type ArticleId = String;

/// Unique identifier for trigger patterns
pub type PatternId = String;

/// Closed set of KB article categories.
///
/// Modeled as a tagged enumeration rather than a free-form string so that
/// filtering stays exhaustive and invalid values are rejected at the serde
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Account,
    Network,
    Email,
    Hardware,
    Software,
    Security,
}

/// A knowledge-base article as supplied by the article repository.
///
/// Immutable once captured in a corpus snapshot; the repository produces a
/// new snapshot (with a new version marker) whenever the corpus changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Unique article identifier
    pub id: ArticleId,
    /// Article title
    pub title: String,
    /// Full article body
    pub body: String,
    /// Article category
    pub category: Category,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp, used as a ranking tie-break
    pub updated_at: DateTime<Utc>,
}

/// Trigger definition for a pattern: either a keyword set or the source of a
/// textual matcher compiled at pattern-set load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TriggerSpec {
    /// Keyword-set trigger; confidence is the fraction of distinct keywords
    /// found in the ticket text
    Keywords { keywords: Vec<String> },
    /// Regex trigger; confidence is binary (1.0 on match, dropped otherwise)
    Matcher { pattern: String },
}

/// A configured trigger pattern suggesting causes/solutions for tickets.
///
/// Patterns are configuration: loaded once per process (or on an explicit
/// reload signal) and never mutated during matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    /// Unique pattern identifier
    pub id: PatternId,
    /// Trigger definition
    pub trigger: TriggerSpec,
    /// Category this pattern diagnoses
    pub category: Category,
    /// KB articles suggested when the pattern matches, in priority order
    #[serde(default)]
    pub suggested_article_ids: Vec<ArticleId>,
}

/// Application state shared across API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub service: Arc<engine::SearchService>,
}
