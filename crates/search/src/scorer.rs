//! BM25 scoring
//!
//! This module provides:
//! - Bm25Params: k1 / b parameters, fixed per index lifetime
//! - ScorerContext: corpus-level statistics captured at build time
//! - Bm25Scorer: per-term contribution with precomputed constants
//!
//! # BM25 Formula
//!
//! For each query term t:
//! score += IDF(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * dl/avgdl))
//!
//! IDF(t) = ln((N - df + 0.5) / (df + 0.5) + 1)
//!
//! Where:
//! - tf = term frequency in document
//! - dl = document length in tokens
//! - avgdl = average document length
//! - N = total documents, df = documents containing t

use retrieval_core::{RetrievalError, RetrievalResult};

// ============================================================================
// Bm25Params
// ============================================================================

/// BM25 tuning parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term frequency saturation (default 1.5)
    pub k1: f64,
    /// Length normalization strength, 0..=1 (default 0.75)
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: 1.5, b: 0.75 }
    }
}

impl Bm25Params {
    /// Create custom parameters
    pub fn new(k1: f64, b: f64) -> Self {
        Bm25Params { k1, b }
    }

    /// Reject non-finite or out-of-range values
    pub fn validate(&self) -> RetrievalResult<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(RetrievalError::invalid_input(format!(
                "bm25 k1 must be a finite value >= 0, got {}",
                self.k1
            )));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(RetrievalError::invalid_input(format!(
                "bm25 b must be within [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }
}

// ============================================================================
// ScorerContext
// ============================================================================

/// Corpus statistics needed for BM25
///
/// Computed once at build time and immutable until the next rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScorerContext {
    /// Total documents in corpus (for IDF calculation)
    pub total_docs: usize,

    /// Average document length in tokens (for length normalization)
    pub avg_doc_len: f64,
}

impl ScorerContext {
    /// Create a new ScorerContext
    pub fn new(total_docs: usize, avg_doc_len: f64) -> Self {
        ScorerContext {
            total_docs,
            avg_doc_len,
        }
    }

    /// Compute IDF for a term with the given document frequency
    pub fn idf(&self, doc_freq: usize) -> f64 {
        let n = self.total_docs as f64;
        let df = doc_freq as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }
}

// ============================================================================
// Bm25Scorer
// ============================================================================

/// Per-term BM25 weight with the parameter-only terms folded in
#[derive(Debug, Clone, Copy)]
pub struct Bm25Scorer {
    k1_plus_1: f64,
    k1_times_one_minus_b: f64,
    k1_times_b_over_avg: f64,
}

impl Bm25Scorer {
    /// Precompute constants for a corpus
    pub fn new(params: Bm25Params, ctx: &ScorerContext) -> Self {
        // An all-empty corpus has avgdl 0; clamp so the division stays finite.
        let avg_doc_len = ctx.avg_doc_len.max(f64::MIN_POSITIVE);
        Bm25Scorer {
            k1_plus_1: params.k1 + 1.0,
            k1_times_one_minus_b: params.k1 * (1.0 - params.b),
            k1_times_b_over_avg: params.k1 * params.b / avg_doc_len,
        }
    }

    /// Saturated, length-normalized term frequency component
    pub fn tf_component(&self, tf: u32, doc_len: u32) -> f64 {
        let tf = tf as f64;
        let dl = doc_len as f64;
        (tf * self.k1_plus_1) / (tf + self.k1_times_one_minus_b + self.k1_times_b_over_avg * dl)
    }

    /// Contribution of one query term to one document's score
    pub fn term_score(&self, idf: f64, tf: u32, doc_len: u32) -> f64 {
        if tf == 0 {
            return 0.0;
        }
        idf * self.tf_component(tf, doc_len)
    }
}

// ============================================================================
// Tests
// ============================================================================
