//! Applies a `RerankScorer` to a short candidate list

use super::{RerankError, RerankScorer};
use retrieval_core::PassageId;
use std::collections::HashMap;
use std::sync::Arc;

/// Default cap on candidates sent to the scorer
pub const DEFAULT_MAX_CANDIDATES: usize = 15;

/// A candidate handed to the reranker
#[derive(Debug, Clone, PartialEq)]
pub struct RerankCandidate {
    /// Passage id
    pub id: PassageId,
    /// Passage text shown to the scorer
    pub text: String,
    /// Current score; replaced by the relevance value when scored
    pub score: f64,
}

impl RerankCandidate {
    /// Create a candidate
    pub fn new(id: impl Into<PassageId>, text: impl Into<String>, score: f64) -> Self {
        RerankCandidate {
            id: id.into(),
            text: text.into(),
            score,
        }
    }
}

/// Reorders candidates with an injected scorer
///
/// Output order: scored candidates by relevance descending (ties keep
/// their incoming order), then candidates the scorer left unscored in
/// their incoming order with their incoming score. Ids the scorer returns
/// that were not offered are ignored.
#[derive(Clone)]
pub struct RerankerAdapter {
    scorer: Arc<dyn RerankScorer>,
    max_candidates: usize,
}

impl std::fmt::Debug for RerankerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RerankerAdapter")
            .field("scorer", &self.scorer.name())
            .field("max_candidates", &self.max_candidates)
            .finish()
    }
}

impl RerankerAdapter {
    /// Wrap a scorer
    pub fn new(scorer: Arc<dyn RerankScorer>) -> Self {
        RerankerAdapter {
            scorer,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    /// Override the number of candidates sent to the scorer (minimum 1)
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates.max(1);
        self
    }

    /// Candidates sent to the scorer per call
    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Name of the wrapped scorer
    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Rerank `candidates` for `query` and keep the best `count`
    ///
    /// `query` should be the user's original query, not the expanded one.
    pub fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<RerankCandidate>,
        count: usize,
    ) -> Result<Vec<RerankCandidate>, RerankError> {
        if candidates.is_empty() || count == 0 {
            return Ok(Vec::new());
        }

        let tail = if candidates.len() > self.max_candidates {
            candidates.split_off(self.max_candidates)
        } else {
            Vec::new()
        };

        let offered: Vec<(PassageId, &str)> = candidates
            .iter()
            .map(|c| (c.id.clone(), c.text.as_str()))
            .collect();
        let scores = self.scorer.score(query, &offered)?;

        let position: HashMap<&PassageId, usize> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (&c.id, i))
            .collect();

        // First score per offered id wins; NaN counts as unscored
        let mut relevance: Vec<Option<f64>> = vec![None; candidates.len()];
        for (id, value) in &scores {
            if let Some(&i) = position.get(id) {
                if relevance[i].is_none() && !value.is_nan() {
                    relevance[i] = Some(*value);
                }
            }
        }
        drop(position);

        if relevance.iter().all(Option::is_none) {
            return Err(RerankError::Empty);
        }

        let mut scored: Vec<(usize, f64, RerankCandidate)> = Vec::new();
        let mut unscored: Vec<RerankCandidate> = Vec::new();
        for (i, (candidate, rel)) in candidates.into_iter().zip(relevance).enumerate() {
            match rel {
                Some(value) => scored.push((i, value, candidate)),
                None => unscored.push(candidate),
            }
        }
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut out: Vec<RerankCandidate> = scored
            .into_iter()
            .map(|(_, value, mut candidate)| {
                candidate.score = value;
                candidate
            })
            .chain(unscored)
            .chain(tail)
            .collect();
        out.truncate(count);
        Ok(out)
    }
}
