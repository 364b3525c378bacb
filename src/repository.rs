//! # Repository Module
//!
//! ## Purpose
//! Collaborator interfaces through which the engine consumes article corpora
//! and pattern configuration, with in-memory implementations backed by JSON
//! files. The engine only ever reads snapshots; ownership and mutation of the
//! underlying data stay with the repository.
//!
//! ## Input/Output Specification
//! - **Input**: JSON article/pattern files, programmatic replacements
//! - **Output**: Versioned corpus snapshots, pattern sets
//! - **Lifecycle**: Explicit load/reload; the version marker changes exactly
//!   when the corpus changes, which is what triggers index rebuilds
//!
//! ## Key Features
//! - Trait seams so the HTTP application can inject real data access
//! - Version-marked corpus snapshots for staleness detection
//! - Cheap snapshot handout via `Arc` sharing, no copying per request

use crate::errors::{Result, SearchError};
use crate::{Article, Pattern};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A point-in-time view of the article corpus.
///
/// The version marker is opaque to the engine; it only compares markers to
/// detect staleness.
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    pub articles: Arc<Vec<Article>>,
    pub version: u64,
}

/// Supplies article corpus snapshots to the engine
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Current corpus snapshot with its version marker
    async fn current_snapshot(&self) -> Result<CorpusSnapshot>;
}

/// Supplies the trigger pattern configuration to the engine
#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// Current pattern set; loaded once per process or on explicit reload
    async fn current_patterns(&self) -> Result<Arc<Vec<Pattern>>>;
}

/// In-memory article repository.
///
/// Holds the corpus behind a lock and bumps the version marker on every
/// replacement, which is what signals staleness to the engine.
pub struct InMemoryArticleRepository {
    state: RwLock<CorpusSnapshot>,
}

impl InMemoryArticleRepository {
    /// Create a repository seeded with `articles` at version 1
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            state: RwLock::new(CorpusSnapshot {
                articles: Arc::new(articles),
                version: 1,
            }),
        }
    }

    /// Load the corpus from a JSON file holding an array of articles
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SearchError::Config {
            message: format!("Failed to read article file {:?}: {}", path, e),
        })?;
        let articles: Vec<Article> = serde_json::from_str(&content)?;
        tracing::info!("Loaded {} articles from {:?}", articles.len(), path);
        Ok(Self::new(articles))
    }

    /// Replace the whole corpus, producing a new snapshot version
    pub async fn replace(&self, articles: Vec<Article>) {
        let mut state = self.state.write().await;
        state.articles = Arc::new(articles);
        state.version += 1;
        tracing::info!(
            "Article corpus replaced: {} articles, version {}",
            state.articles.len(),
            state.version
        );
    }
}

#[async_trait]
impl ArticleRepository for InMemoryArticleRepository {
    async fn current_snapshot(&self) -> Result<CorpusSnapshot> {
        Ok(self.state.read().await.clone())
    }
}

/// In-memory pattern repository
pub struct InMemoryPatternRepository {
    patterns: RwLock<Arc<Vec<Pattern>>>,
}

impl InMemoryPatternRepository {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self {
            patterns: RwLock::new(Arc::new(patterns)),
        }
    }

    /// Load patterns from a JSON file holding an array of patterns
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SearchError::Config {
            message: format!("Failed to read pattern file {:?}: {}", path, e),
        })?;
        let patterns: Vec<Pattern> = serde_json::from_str(&content)?;
        tracing::info!("Loaded {} patterns from {:?}", patterns.len(), path);
        Ok(Self::new(patterns))
    }

    /// Replace the pattern set; takes effect on the next engine reload
    pub async fn replace(&self, patterns: Vec<Pattern>) {
        let mut current = self.patterns.write().await;
        *current = Arc::new(patterns);
        tracing::info!("Pattern set replaced: {} patterns", current.len());
    }
}

#[async_trait]
impl PatternRepository for InMemoryPatternRepository {
    async fn current_patterns(&self) -> Result<Arc<Vec<Pattern>>> {
        Ok(self.patterns.read().await.clone())
    }
}
