//! Second-pass re-ranking of a short candidate list
//!
//! Re-ranking sits between filtering and the final result:
//!
//! ```text
//! fused + filtered top-N → RerankerAdapter → RerankScorer::score
//!     → reordered, truncated top-N
//! ```
//!
//! The scorer sees the user's original query. A scorer failure never fails
//! retrieval; the orchestrator falls back to the pre-rerank order.

pub mod adapter;
pub mod api;
pub mod error;
pub mod prompt;

pub use adapter::{RerankCandidate, RerankerAdapter, DEFAULT_MAX_CANDIDATES};
pub use api::ApiReranker;
pub use error::RerankError;

use retrieval_core::PassageId;

/// Trait for relevance scorers.
///
/// Implementations score `(id, text)` passages against a query and return
/// `(id, relevance)` pairs; higher is more relevant. They may leave some
/// passages unscored. The trait is object-safe for use as
/// `Arc<dyn RerankScorer>`.
///
/// # Implementations
///
/// - `ApiReranker`: calls an OpenAI-compatible endpoint
pub trait RerankScorer: Send + Sync {
    /// Score the relevance of each passage to the query.
    fn score(
        &self,
        query: &str,
        passages: &[(PassageId, &str)],
    ) -> Result<Vec<(PassageId, f64)>, RerankError>;

    /// Name for logging
    fn name(&self) -> &str {
        "scorer"
    }
}
