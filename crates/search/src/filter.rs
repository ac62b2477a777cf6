//! Attribute filtering and oversampling
//!
//! Filtering runs after ranking, so the candidate pool has to be larger
//! than the number of results wanted. `OversamplePolicy` decides how many
//! candidates each ranking source is asked for; `filter_ranked` then walks
//! the fused list in rank order and keeps matches until it has enough.
//!
//! Under-fulfillment is not an error: when the oversampled pool runs out,
//! fewer than the requested number of hits come back.

use crate::index::LexicalIndex;
use retrieval_core::{FusedHit, MetadataFilter, PassageId, RetrievalError, RetrievalResult};
use std::collections::HashMap;

// ============================================================================
// filter_ranked
// ============================================================================

/// Keep hits whose metadata satisfies `filter`, in their original order,
/// stopping after `limit` matches
///
/// `metadata_of` resolves a passage id to its metadata. Ids it cannot
/// resolve never match a non-empty filter. An empty filter keeps
/// everything (up to `limit`).
pub fn filter_ranked<'a, F>(
    hits: Vec<FusedHit>,
    filter: &MetadataFilter,
    limit: usize,
    metadata_of: F,
) -> Vec<FusedHit>
where
    F: Fn(&PassageId) -> Option<&'a HashMap<String, String>>,
{
    if filter.is_empty() {
        let mut hits = hits;
        hits.truncate(limit);
        return hits;
    }

    hits.into_iter()
        .filter(|hit| metadata_of(&hit.id).is_some_and(|meta| filter.matches(meta)))
        .take(limit)
        .collect()
}

/// `filter_ranked` resolving metadata through a lexical index
pub fn filter_with_index(
    hits: Vec<FusedHit>,
    filter: &MetadataFilter,
    limit: usize,
    index: &LexicalIndex,
) -> Vec<FusedHit> {
    filter_ranked(hits, filter, limit, |id| {
        index.passage(id).map(|p| &p.metadata)
    })
}

// ============================================================================
// OversamplePolicy
// ============================================================================

/// How many candidates to request from each ranking source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    /// Final number of hits wanted
    pub requested: usize,
    /// Multiplier applied to `requested` for the lexical index
    pub multiplier: usize,
    /// Candidates to request from the lexical index
    pub lexical: usize,
    /// Candidates to request from the vector provider
    pub vector: usize,
}

/// Fetch-size policy
///
/// `fetch = N * max(filtered ? filter_multiplier : 1, hybrid ? 1 : lexical_headroom)`
///
/// A vector provider that filters natively is asked for the plain
/// (un-oversampled) count, or the headroom count when that applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OversamplePolicy {
    filter_multiplier: usize,
    lexical_headroom: usize,
}

impl Default for OversamplePolicy {
    fn default() -> Self {
        OversamplePolicy {
            filter_multiplier: 3,
            lexical_headroom: 2,
        }
    }
}

impl OversamplePolicy {
    /// Create a policy; both multipliers must be at least 1
    pub fn new(filter_multiplier: usize, lexical_headroom: usize) -> RetrievalResult<Self> {
        if filter_multiplier == 0 {
            return Err(RetrievalError::invalid_input(
                "oversample multiplier must be >= 1",
            ));
        }
        if lexical_headroom == 0 {
            return Err(RetrievalError::invalid_input(
                "lexical headroom multiplier must be >= 1",
            ));
        }
        Ok(OversamplePolicy {
            filter_multiplier,
            lexical_headroom,
        })
    }

    /// Multiplier applied when a filter is present
    pub fn filter_multiplier(&self) -> usize {
        self.filter_multiplier
    }

    /// Multiplier applied on the lexical-only path
    pub fn lexical_headroom(&self) -> usize {
        self.lexical_headroom
    }

    /// Compute the fetch sizes for one request
    pub fn plan(
        &self,
        requested: usize,
        filtered: bool,
        hybrid: bool,
        native_vector_filter: bool,
    ) -> FetchPlan {
        let filter_m = if filtered { self.filter_multiplier } else { 1 };
        let headroom_m = if hybrid { 1 } else { self.lexical_headroom };
        let multiplier = filter_m.max(headroom_m);
        let lexical = requested.saturating_mul(multiplier);

        let vector = if !hybrid {
            0
        } else if native_vector_filter {
            requested
        } else {
            lexical
        };

        FetchPlan {
            requested,
            multiplier,
            lexical,
            vector,
        }
    }
}
