//! Retrieval quality metrics
//!
//! Hit rate@k and mean reciprocal rank (MRR) over a labelled query set.
//! A query's relevant passages are given either as explicit ids or as
//! expected topics: a passage is relevant when its text contains any topic
//! (case-insensitive substring).

use crate::retriever::{RetrieveRequest, Retriever};
use retrieval_core::{PassageId, RetrievalResult};
use retrieval_search::LexicalIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default cutoff
pub const DEFAULT_TOP_K: usize = 5;

/// 1-based rank of the first relevant id within the top `k`
pub fn first_relevant_rank<F>(ranked: &[PassageId], k: usize, is_relevant: F) -> Option<usize>
where
    F: Fn(&PassageId) -> bool,
{
    ranked
        .iter()
        .take(k)
        .position(is_relevant)
        .map(|i| i + 1)
}

/// 1.0 if any of the top `k` ids is relevant, else 0.0
pub fn hit_rate_at_k(ranked: &[PassageId], relevant: &HashSet<PassageId>, k: usize) -> f64 {
    if first_relevant_rank(ranked, k, |id| relevant.contains(id)).is_some() {
        1.0
    } else {
        0.0
    }
}

/// 1 / rank of the first relevant id within the top `k`, or 0.0
pub fn reciprocal_rank_at_k(ranked: &[PassageId], relevant: &HashSet<PassageId>, k: usize) -> f64 {
    first_relevant_rank(ranked, k, |id| relevant.contains(id)).map_or(0.0, |r| 1.0 / r as f64)
}

/// Case-insensitive check that `text` mentions any of `topics`
pub fn mentions_any_topic(text: &str, topics: &[String]) -> bool {
    let text = text.to_lowercase();
    topics.iter().any(|t| text.contains(&t.to_lowercase()))
}

/// How relevance is judged for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    /// These passage ids are relevant
    Ids(HashSet<PassageId>),
    /// Passages whose text mentions any of these topics are relevant
    Topics(Vec<String>),
}

impl Relevance {
    fn judge(&self, id: &PassageId, index: &LexicalIndex) -> bool {
        match self {
            Relevance::Ids(ids) => ids.contains(id),
            Relevance::Topics(topics) => index
                .passage(id)
                .is_some_and(|p| mentions_any_topic(&p.text, topics)),
        }
    }
}

/// A labelled query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationQuery {
    /// Query text
    pub query: String,
    /// Relevance judgment
    pub relevance: Relevance,
}

impl EvaluationQuery {
    /// Query judged by explicit relevant ids
    pub fn with_ids<I, S>(query: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PassageId>,
    {
        EvaluationQuery {
            query: query.into(),
            relevance: Relevance::Ids(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Query judged by expected topics
    pub fn with_topics<I, S>(query: impl Into<String>, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EvaluationQuery {
            query: query.into(),
            relevance: Relevance::Topics(topics.into_iter().map(Into::into).collect()),
        }
    }
}

/// Outcome of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Query text
    pub query: String,
    /// Rank of the first relevant hit within the cutoff
    pub first_relevant_rank: Option<usize>,
    /// 1 / first_relevant_rank, or 0
    pub reciprocal_rank: f64,
    /// Whether retrieval skipped any stage for this query
    pub degraded: bool,
}

impl QueryOutcome {
    /// Whether a relevant hit was found within the cutoff
    pub fn found_relevant(&self) -> bool {
        self.first_relevant_rank.is_some()
    }
}

/// Aggregate metrics over a query set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Cutoff
    pub top_k: usize,
    /// Fraction of queries with a relevant hit in the top k
    pub hit_rate: f64,
    /// Mean reciprocal rank
    pub mrr: f64,
    /// Per-query outcomes in input order
    pub outcomes: Vec<QueryOutcome>,
}

impl EvaluationReport {
    /// Run every query through `retriever` and score the top `top_k` hits
    ///
    /// Uses the index snapshot live at the start for topic judgments.
    pub fn from_queries(
        retriever: &Retriever,
        queries: &[EvaluationQuery],
        top_k: usize,
        use_hybrid: bool,
        use_rerank: bool,
    ) -> RetrievalResult<Self> {
        let snapshot = retriever.index().load()?;
        let mut outcomes = Vec::with_capacity(queries.len());

        for q in queries {
            let request = RetrieveRequest::new(q.query.clone(), top_k)
                .with_hybrid(use_hybrid)
                .with_rerank(use_rerank);
            let response = retriever.retrieve(&request)?;
            let ranked: Vec<PassageId> = response.hits.iter().map(|h| h.id.clone()).collect();
            let rank = first_relevant_rank(&ranked, top_k, |id| {
                q.relevance.judge(id, snapshot.index())
            });
            outcomes.push(QueryOutcome {
                query: q.query.clone(),
                first_relevant_rank: rank,
                reciprocal_rank: rank.map_or(0.0, |r| 1.0 / r as f64),
                degraded: response.is_degraded(),
            });
        }

        Ok(Self::from_outcomes(top_k, outcomes))
    }

    /// Aggregate already-scored outcomes; an empty set scores 0
    pub fn from_outcomes(top_k: usize, outcomes: Vec<QueryOutcome>) -> Self {
        let total = outcomes.len();
        let (hit_rate, mrr) = if total == 0 {
            (0.0, 0.0)
        } else {
            let hits = outcomes.iter().filter(|o| o.found_relevant()).count();
            let rr: f64 = outcomes.iter().map(|o| o.reciprocal_rank).sum();
            (hits as f64 / total as f64, rr / total as f64)
        };
        EvaluationReport {
            top_k,
            hit_rate,
            mrr,
            outcomes,
        }
    }

    /// Number of queries with a relevant hit
    pub fn queries_with_relevant(&self) -> usize {
        self.outcomes.iter().filter(|o| o.found_relevant()).count()
    }
}
