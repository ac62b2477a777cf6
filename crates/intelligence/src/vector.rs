//! Vector search provider interface
//!
//! Embedding and nearest-neighbor search live outside this crate. A provider
//! hands back an ordered candidate list; the orchestrator only ever uses the
//! order, never the raw similarity or distance values.

use retrieval_core::{assign_ranks, Candidate, MetadataFilter, PassageId};
use thiserror::Error;

/// Errors a vector search provider can report
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VectorSearchError {
    /// The provider did not answer in time
    #[error("vector search timed out")]
    Timeout,
    /// The backing store is unreachable or not loaded
    #[error("vector search unavailable: {0}")]
    Unavailable(String),
    /// The provider failed while serving the request
    #[error("vector search failed: {0}")]
    Provider(String),
}

/// External nearest-neighbor search
///
/// Implementations return at most `count` candidates ordered best-first,
/// with no repeated ids. When `supports_native_filter` is true the
/// provider applies `filter` itself and is asked only for the final count;
/// otherwise `filter` may be ignored and the orchestrator oversamples.
pub trait VectorSearchProvider: Send + Sync {
    /// Search for passages similar to `query`
    fn search(
        &self,
        query: &str,
        count: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Candidate>, VectorSearchError>;

    /// Whether `search` honors the metadata filter
    fn supports_native_filter(&self) -> bool {
        false
    }

    /// Name for logging
    fn name(&self) -> &str {
        "vector"
    }
}

/// Direction of a provider's raw score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOrder {
    /// Similarity: larger is more relevant
    HigherIsBetter,
    /// Distance: smaller is more relevant
    LowerIsBetter,
}

/// Turn raw (id, score) pairs into a best-first ranked candidate list
///
/// NaN scores are dropped. Equal scores are ordered by id. The raw score is
/// kept on each candidate for diagnostics.
pub fn rank_scored(hits: Vec<(PassageId, f64)>, order: ScoreOrder) -> Vec<Candidate> {
    let mut hits: Vec<(PassageId, f64)> = hits.into_iter().filter(|(_, s)| !s.is_nan()).collect();
    hits.sort_by(|a, b| {
        let by_score = match order {
            ScoreOrder::HigherIsBetter => b.1.total_cmp(&a.1),
            ScoreOrder::LowerIsBetter => a.1.total_cmp(&b.1),
        };
        by_score.then_with(|| a.0.cmp(&b.0))
    });
    assign_ranks(hits)
}

/// Provider returning a fixed ranked list for every query
#[derive(Debug, Clone, Default)]
pub struct StaticVectorProvider {
    ranked: Vec<Candidate>,
}

impl StaticVectorProvider {
    /// Serve `ranked` (already best-first) for every query
    pub fn new(ranked: Vec<Candidate>) -> Self {
        StaticVectorProvider { ranked }
    }

    /// Serve the given ids in order
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PassageId>,
    {
        let ranked: Vec<(PassageId, f64)> = ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id.into(), 1.0 / (i + 1) as f64))
            .collect();
        StaticVectorProvider {
            ranked: assign_ranks(ranked),
        }
    }
}

impl VectorSearchProvider for StaticVectorProvider {
    fn search(
        &self,
        _query: &str,
        count: usize,
        _filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Candidate>, VectorSearchError> {
        Ok(self.ranked.iter().take(count).cloned().collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}
