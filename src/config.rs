//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the KB search engine, supporting
//! configuration files and environment variable overrides with validation and
//! type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, weight constraints
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (highest priority)
//! 2. Configuration files
//! 3. Default values (lowest priority)
//!
//! ## Usage
//! ```rust,no_run
//! use kb_search::config::Config;
//!
//! let config = Config::from_file("config.toml").unwrap();
//! println!("Server port: {}", config.server.port);
//! ```

use crate::errors::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Corpus and pattern data sources
    pub corpus: CorpusConfig,
    /// Tokenizer behavior
    pub tokenizer: TokenizerConfig,
    /// Relevance scoring constants
    pub scoring: ScoringConfig,
    /// Pattern matcher behavior
    pub matcher: MatcherConfig,
    /// Logging and monitoring
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

/// Corpus and pattern data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// JSON file holding the KB article corpus
    pub articles_path: PathBuf,
    /// JSON file holding the trigger pattern set
    pub patterns_path: PathBuf,
}

/// Tokenizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Minimum term length in characters; shorter tokens are dropped
    pub min_term_length: usize,
    /// Extra stop-words merged with the built-in list
    pub extra_stopwords: Vec<String>,
}

/// Relevance scoring configuration.
///
/// Title matches are weighted strictly higher than body matches;
/// `title_weight` must stay at least twice `body_weight` (validated at load).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Multiplier for title-field TF-IDF contributions
    pub title_weight: f64,
    /// Multiplier for body-field TF-IDF contributions
    pub body_weight: f64,
    /// Fixed bonus when the normalized query appears verbatim in the title
    pub exact_title_bonus: f64,
    /// Characters kept on each side of the first matched term in a snippet
    pub snippet_radius: usize,
    /// Body-prefix length used when no query term occurs literally
    pub snippet_fallback_length: usize,
    /// Default page size when the request omits `limit`
    pub default_limit: usize,
}

/// Pattern matcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum number of matched patterns returned per ticket
    pub max_matches: usize,
}

/// Logging and monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            corpus: CorpusConfig::default(),
            tokenizer: TokenizerConfig::default(),
            scoring: ScoringConfig::default(),
            matcher: MatcherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            articles_path: PathBuf::from("./data/articles.json"),
            patterns_path: PathBuf::from("./data/patterns.json"),
        }
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_term_length: 2,
            extra_stopwords: Vec::new(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            title_weight: 2.5,
            body_weight: 1.0,
            exact_title_bonus: 1.0,
            snippet_radius: 80,
            snippet_fallback_length: 160,
            default_limit: 20,
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { max_matches: 5 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| SearchError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| SearchError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("KB_SEARCH_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("KB_SEARCH_PORT") {
            self.server.port = port.parse().map_err(|_| SearchError::Config {
                message: "Invalid port number in KB_SEARCH_PORT".to_string(),
            })?;
        }
        if let Ok(articles) = std::env::var("KB_SEARCH_ARTICLES_PATH") {
            self.corpus.articles_path = PathBuf::from(articles);
        }
        if let Ok(patterns) = std::env::var("KB_SEARCH_PATTERNS_PATH") {
            self.corpus.patterns_path = PathBuf::from(patterns);
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(SearchError::validation("server.port", "Port cannot be zero"));
        }

        if self.tokenizer.min_term_length == 0 {
            return Err(SearchError::validation(
                "tokenizer.min_term_length",
                "Minimum term length must be at least 1",
            ));
        }

        if self.scoring.body_weight <= 0.0 || self.scoring.title_weight <= 0.0 {
            return Err(SearchError::validation(
                "scoring",
                "Field weights must be positive",
            ));
        }

        if self.scoring.title_weight < self.scoring.body_weight * 2.0 {
            return Err(SearchError::validation(
                "scoring.title_weight",
                "Title weight must be at least twice the body weight",
            ));
        }

        if self.scoring.default_limit == 0 {
            return Err(SearchError::validation(
                "scoring.default_limit",
                "Default result limit must be greater than zero",
            ));
        }

        if self.matcher.max_matches == 0 {
            return Err(SearchError::validation(
                "matcher.max_matches",
                "Maximum pattern matches must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn title_weight_must_dominate_body_weight() {
        let mut config = Config::default();
        config.scoring.title_weight = 1.5;
        config.scoring.body_weight = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let mut config = Config::default();
        config.scoring.default_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [scoring]
            title_weight = 3.0
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.scoring.title_weight, 3.0);
        assert_eq!(config.scoring.default_limit, 20);
    }
}
