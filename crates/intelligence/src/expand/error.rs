//! Error types for query expansion

use crate::llm_client::LlmClientError;
use thiserror::Error;

/// Errors that can occur during query expansion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpandError {
    /// HTTP request failed (network unreachable, connection refused, etc.)
    #[error("network error: {0}")]
    Network(String),
    /// Failed to parse model response into expansion terms
    #[error("parse error: {0}")]
    Parse(String),
    /// Model request timed out
    #[error("expansion request timed out")]
    Timeout,
    /// Required cargo feature is not enabled
    #[error("feature '{0}' not enabled")]
    FeatureDisabled(&'static str),
}

impl From<LlmClientError> for ExpandError {
    fn from(e: LlmClientError) -> Self {
        match e {
            LlmClientError::Network(msg) => ExpandError::Network(msg),
            LlmClientError::Parse(msg) => ExpandError::Parse(msg),
            LlmClientError::Timeout => ExpandError::Timeout,
            LlmClientError::FeatureDisabled(feature) => ExpandError::FeatureDisabled(feature),
        }
    }
}
