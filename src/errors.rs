//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the KB search engine, providing the error
//! taxonomy shared by all components and conversion utilities for wrapped
//! error sources.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from various system components
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Validation, Pattern, Index, Configuration, Internal
//!
//! ## Key Features
//! - Request validation failures kept distinct from server faults
//! - Non-fatal pattern compile errors that can be aggregated per request
//! - Fatal index build errors that force snapshot fallback
//! - Opaque internal errors carrying a correlation reference for logs

use thiserror::Error;
use uuid::Uuid;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, SearchError>;

/// Error types for the KB search engine
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed or empty request fields. Returned directly to the caller
    /// and never logged as a server fault.
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// A single pattern's trigger failed to compile. Non-fatal: the pattern
    /// is excluded from matching and the exclusion reported to the caller.
    #[error("Pattern '{pattern_id}' trigger failed to compile: {reason}")]
    PatternCompile { pattern_id: String, reason: String },

    /// The article corpus is internally inconsistent. Fatal to the build;
    /// the orchestrator must not serve a partially built index.
    #[error("Index build failed: {reason}")]
    IndexBuild { reason: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Catch-all for unexpected failures. The message is safe to surface;
    /// the correlation id links the response to server-side logs.
    #[error("Internal error [{correlation_id}]: {message}")]
    Internal {
        message: String,
        correlation_id: Uuid,
    },

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    /// Build an internal error with a fresh correlation reference
    pub fn internal(message: impl Into<String>) -> Self {
        SearchError::Internal {
            message: message.into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Build a validation error for a request field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SearchError::ValidationFailed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, SearchError::ValidationFailed { .. })
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            SearchError::ValidationFailed { .. } => "validation",
            SearchError::PatternCompile { .. } => "pattern",
            SearchError::IndexBuild { .. } => "index",
            SearchError::Config { .. } => "configuration",
            SearchError::Internal { .. } => "internal",
            SearchError::Json(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        let err = SearchError::validation("query", "must not be empty");
        assert!(err.is_client_error());
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn internal_errors_carry_a_correlation_id() {
        let err = SearchError::internal("boom");
        match err {
            SearchError::Internal { correlation_id, .. } => {
                assert!(!correlation_id.is_nil());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
