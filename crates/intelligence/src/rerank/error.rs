//! Error types for re-ranking

use crate::llm_client::LlmClientError;
use thiserror::Error;

/// Errors that can occur during re-ranking
///
/// None of these fail a retrieval: the orchestrator keeps the pre-rerank
/// order and records a degradation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RerankError {
    /// HTTP request failed (network unreachable, connection refused, etc.)
    #[error("network error: {0}")]
    Network(String),
    /// Failed to parse model response into valid scores
    #[error("parse error: {0}")]
    Parse(String),
    /// Model request timed out
    #[error("rerank request timed out")]
    Timeout,
    /// The scorer answered but scored none of the candidates
    #[error("scorer returned no scores for the candidates")]
    Empty,
    /// Required cargo feature is not enabled
    #[error("feature '{0}' not enabled")]
    FeatureDisabled(&'static str),
    /// Any other scorer failure
    #[error("scorer failed: {0}")]
    Scorer(String),
}

impl From<LlmClientError> for RerankError {
    fn from(e: LlmClientError) -> Self {
        match e {
            LlmClientError::Network(msg) => RerankError::Network(msg),
            LlmClientError::Parse(msg) => RerankError::Parse(msg),
            LlmClientError::Timeout => RerankError::Timeout,
            LlmClientError::FeatureDisabled(feature) => RerankError::FeatureDisabled(feature),
        }
    }
}
