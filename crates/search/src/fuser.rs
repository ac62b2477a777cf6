//! Fusion infrastructure for combining ranked lists
//!
//! This module provides:
//! - Fuser trait for pluggable fusion algorithms
//! - RRFFuser: Reciprocal Rank Fusion (default)
//! - pass_through: single-list identity ranking
//!
//! Fusion works on rank positions only. Raw scores from different methods
//! are never compared.

use retrieval_core::{Candidate, FusedHit, PassageId};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

// ============================================================================
// Fuser Trait
// ============================================================================

/// Pluggable fusion interface
///
/// # Thread Safety
///
/// Fusers must be Send + Sync for concurrent retrieval.
pub trait Fuser: Send + Sync {
    /// Merge ranked lists, each scaled by its weight
    ///
    /// Each list must already be ordered best-first. Every occurrence of an
    /// id contributes, so the same id across lists (or repeated within one)
    /// is merged into a single hit. The output is the full fused set,
    /// untruncated.
    fn fuse_weighted(&self, lists: &[(&[Candidate], f64)]) -> Vec<FusedHit>;

    /// Merge lists with every weight at 1.0
    fn fuse(&self, lists: &[&[Candidate]]) -> Vec<FusedHit> {
        let weighted: Vec<(&[Candidate], f64)> = lists.iter().map(|l| (*l, 1.0)).collect();
        self.fuse_weighted(&weighted)
    }

    /// Name for debugging and logging
    fn name(&self) -> &str;
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Deterministic fused ordering: score desc, best rank asc, id asc
pub fn fused_order(a: &FusedHit, b: &FusedHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.best_rank.cmp(&b.best_rank))
        .then_with(|| a.id.cmp(&b.id))
}

/// Treat a single ranked list as already fused
///
/// Order and scores are kept as they are; with one signal there is
/// nothing to fuse.
pub fn pass_through(list: Vec<Candidate>) -> Vec<FusedHit> {
    list.into_iter()
        .enumerate()
        .map(|(i, c)| FusedHit {
            id: c.id,
            score: c.score,
            best_rank: (i + 1) as u32,
        })
        .collect()
}

// ============================================================================
// RRFFuser
// ============================================================================

/// Reciprocal Rank Fusion (RRF)
///
/// RRF Score = sum(1 / (k + rank)) across all lists
/// Where k is a smoothing constant (default 60) and rank is the 1-based
/// position within each list.
///
/// # Example
///
/// ```text
/// Given:
///   - List A: [doc1, doc2, doc3]
///   - List B: [doc2, doc4, doc1]
///   - k_rrf = 60
///
/// RRF scores:
///   doc1: 1/(60+1) + 1/(60+3) = 0.0164 + 0.0159 = 0.0323
///   doc2: 1/(60+2) + 1/(60+1) = 0.0161 + 0.0164 = 0.0325  <- highest
///   doc3: 1/(60+3) = 0.0159
///   doc4: 1/(60+2) = 0.0161
///
/// Final ranking: [doc2, doc1, doc4, doc3]
/// ```
#[derive(Debug, Clone)]
pub struct RRFFuser {
    /// Smoothing constant (default 60)
    k_rrf: u32,
}

impl Default for RRFFuser {
    fn default() -> Self {
        RRFFuser { k_rrf: 60 }
    }
}

impl RRFFuser {
    /// Create a new RRFFuser with custom k value
    pub fn new(k_rrf: u32) -> Self {
        RRFFuser { k_rrf }
    }

    /// Get the k parameter
    pub fn k_rrf(&self) -> u32 {
        self.k_rrf
    }

    /// Contribution of a 1-based rank
    pub fn contribution(&self, rank: u32) -> f64 {
        1.0 / (self.k_rrf as f64 + rank as f64)
    }
}

impl Fuser for RRFFuser {
    /// Each document scores `sum(weight / (k + rank))` over the positions
    /// it holds
    fn fuse_weighted(&self, lists: &[(&[Candidate], f64)]) -> Vec<FusedHit> {
        let mut fused: FxHashMap<&PassageId, (f64, u32)> = FxHashMap::default();

        for (list, weight) in lists {
            for (pos, candidate) in list.iter().enumerate() {
                let rank = (pos + 1) as u32;
                let contribution = weight * self.contribution(rank);
                let entry = fused.entry(&candidate.id).or_insert((0.0, u32::MAX));
                entry.0 += contribution;
                entry.1 = entry.1.min(rank);
            }
        }

        let mut hits: Vec<FusedHit> = fused
            .into_iter()
            .map(|(id, (score, best_rank))| FusedHit {
                id: id.clone(),
                score,
                best_rank,
            })
            .collect();
        hits.sort_by(fused_order);
        hits
    }

    fn name(&self) -> &str {
        "rrf"
    }
}

// ============================================================================
// Tests
// ============================================================================
