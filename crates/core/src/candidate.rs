//! Ranked result types
//!
//! This module defines the per-method and fused result types:
//! - Candidate: one entry of a single method's ranked list
//! - FusedHit: one entry of a rank-fused list
//! - SearchHit: one entry of the final, caller-facing list
//!
//! Scores are method-relative. A lexical score and a vector similarity
//! are never compared directly; only rank positions cross methods.

use crate::passage::PassageId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Candidate
// ============================================================================

/// A scored reference produced by one ranking method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Passage this candidate points at
    pub id: PassageId,

    /// Method-relative score (higher = more relevant)
    pub score: f64,

    /// Position within the source list (1-indexed)
    pub rank: u32,
}

impl Candidate {
    /// Create a new Candidate
    pub fn new(id: impl Into<PassageId>, score: f64, rank: u32) -> Self {
        Candidate {
            id: id.into(),
            score,
            rank,
        }
    }
}

/// Turn an already-ordered `(id, score)` sequence into candidates with
/// 1-based ranks.
pub fn assign_ranks<I>(ordered: I) -> Vec<Candidate>
where
    I: IntoIterator<Item = (PassageId, f64)>,
{
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (id, score))| Candidate {
            id,
            score,
            rank: (i + 1) as u32,
        })
        .collect()
}

// ============================================================================
// FusedHit
// ============================================================================

/// A passage after rank fusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    /// Passage id
    pub id: PassageId,

    /// Sum of per-list contributions
    pub score: f64,

    /// Best (lowest) rank the passage held in any input list
    pub best_rank: u32,
}

// ============================================================================
// SearchHit
// ============================================================================

/// A single entry of the final retrieval result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Passage id
    pub id: PassageId,

    /// Final score; its meaning depends on the last stage that ran
    /// (BM25, RRF sum, or reranker relevance)
    pub score: f64,

    /// Rank in result set (1-indexed)
    pub rank: u32,
}

impl SearchHit {
    /// Create a new SearchHit
    pub fn new(id: impl Into<PassageId>, score: f64, rank: u32) -> Self {
        SearchHit {
            id: id.into(),
            score,
            rank,
        }
    }
}

impl From<Candidate> for FusedHit {
    fn from(c: Candidate) -> Self {
        FusedHit {
            id: c.id,
            score: c.score,
            best_rank: c.rank,
        }
    }
}
