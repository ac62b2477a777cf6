//! Error types for retrieval
//!
//! This module defines the errors that can escape the retrieval engine.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Only fatal conditions live here. Failures of external collaborators
//! (vector search, query expansion, reranking) are recovered by the
//! orchestrator and reported as degradations, never as errors.

use thiserror::Error;

/// Result type alias for retrieval operations
pub type RetrievalResult<T> = std::result::Result<T, RetrievalError>;

/// Error types for the retrieval engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetrievalError {
    /// A query arrived before any index snapshot was published
    #[error("lexical index has not been built")]
    IndexNotBuilt,

    /// Filter expression could not be parsed or is structurally invalid
    #[error("invalid filter: {reason}")]
    InvalidFilter {
        /// What was wrong with the filter
        reason: String,
    },

    /// Caller supplied an invalid argument or configuration value
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: String,
    },

    /// Corpus or term statistics are inconsistent
    #[error("index corruption: {reason}")]
    Corruption {
        /// Description of the inconsistency
        reason: String,
    },

    /// Unexpected internal failure (thread spawn, poisoned channel, ...)
    #[error("internal error: {reason}")]
    Internal {
        /// Description of the failure
        reason: String,
    },
}

impl RetrievalError {
    /// Build an [`RetrievalError::InvalidFilter`]
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        RetrievalError::InvalidFilter {
            reason: reason.into(),
        }
    }

    /// Build an [`RetrievalError::InvalidInput`]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        RetrievalError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Build a [`RetrievalError::Corruption`]
    pub fn corruption(reason: impl Into<String>) -> Self {
        RetrievalError::Corruption {
            reason: reason.into(),
        }
    }

    /// Build an [`RetrievalError::Internal`]
    pub fn internal(reason: impl Into<String>) -> Self {
        RetrievalError::Internal {
            reason: reason.into(),
        }
    }

    /// Precondition violations are the caller's fault; retrying the same
    /// call will fail the same way.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RetrievalError::IndexNotBuilt
                | RetrievalError::InvalidFilter { .. }
                | RetrievalError::InvalidInput { .. }
        )
    }

    /// Corruption means the index (or the corpus it was built from) cannot
    /// be trusted. The previous snapshot stays live.
    pub fn is_corruption(&self) -> bool {
        matches!(self, RetrievalError::Corruption { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_index_not_built() {
        let msg = RetrievalError::IndexNotBuilt.to_string();
        assert!(msg.contains("not been built"));
    }

    #[test]
    fn test_error_display_invalid_filter() {
        let err = RetrievalError::invalid_filter("missing '=' in 'topic'");
        let msg = err.to_string();
        assert!(msg.contains("invalid filter"));
        assert!(msg.contains("topic"));
    }

    #[test]
    fn test_error_display_corruption() {
        let err = RetrievalError::corruption("duplicate passage id 'p1'");
        let msg = err.to_string();
        assert!(msg.contains("index corruption"));
        assert!(msg.contains("p1"));
    }

    #[test]
    fn test_error_classification() {
        assert!(RetrievalError::IndexNotBuilt.is_precondition());
        assert!(RetrievalError::invalid_filter("x").is_precondition());
        assert!(RetrievalError::invalid_input("x").is_precondition());
        assert!(!RetrievalError::corruption("x").is_precondition());
        assert!(RetrievalError::corruption("x").is_corruption());
        assert!(!RetrievalError::internal("x").is_corruption());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> RetrievalResult<i32> {
            Ok(42)
        }

        fn returns_error() -> RetrievalResult<i32> {
            Err(RetrievalError::IndexNotBuilt)
        }

        assert_eq!(returns_result().unwrap(), 42);
        assert!(returns_error().is_err());
    }
}
