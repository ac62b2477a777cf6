//! Retrieval orchestrator
//!
//! `Retriever` is the public entry point. One call sequences:
//!
//! ```text
//! query ──► expand (optional, deadline) ──► search query
//!                                              │
//!               ┌──────────────────────────────┴───────────────┐
//!               ▼                                              ▼
//!        vector provider (worker thread, deadline)     lexical index (caller thread)
//!               └──────────────────────┬───────────────────────┘
//!                                      ▼
//!                        RRF fusion (or lexical pass-through)
//!                                      ▼
//!                        attribute filter / truncate to N
//!                                      ▼
//!                  rerank with the ORIGINAL query (optional, deadline)
//!                                      ▼
//!                                 ranked hits
//! ```
//!
//! External stages never fail a request. A missing, failing or slow
//! collaborator is skipped and recorded as a `Degradation` on the response,
//! logged and passed to the observer. Only precondition violations and
//! index corruption surface as errors.
//!
//! Each external stage runs on its own `CallLane`. A stage whose lane is
//! full (workers stuck past their deadline) is skipped without spawning.

use crate::config::RetrievalConfig;
use crate::deadline::CallLane;
use crate::expand::{ApiExpander, QueryExpander};
use crate::rerank::{ApiReranker, RerankCandidate, RerankScorer, RerankerAdapter};
use crate::vector::VectorSearchProvider;
use retrieval_core::{
    Candidate, FusedHit, MetadataFilter, Passage, PassageId, RetrievalResult, SearchHit,
};
use retrieval_search::{
    filter_with_index, pass_through, Fuser, IndexHandle, IndexSnapshot, OversamplePolicy,
    RRFFuser,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

// ============================================================================
// Request / Response
// ============================================================================

/// One retrieval call
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveRequest {
    /// Raw user query
    pub query: String,
    /// Number of hits wanted
    pub count: usize,
    /// Metadata constraints; `None` or an empty filter means no filtering
    pub filter: Option<MetadataFilter>,
    /// Fuse lexical results with the vector provider's (default true)
    pub use_hybrid: bool,
    /// Rerank the final list (default false)
    pub use_rerank: bool,
    /// Override the configured expansion switch for this call
    pub expand: Option<bool>,
}

impl RetrieveRequest {
    /// Hybrid, unfiltered, no rerank
    pub fn new(query: impl Into<String>, count: usize) -> Self {
        RetrieveRequest {
            query: query.into(),
            count,
            filter: None,
            use_hybrid: true,
            use_rerank: false,
            expand: None,
        }
    }

    /// Builder: set metadata filter
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Builder: enable or disable hybrid fusion
    pub fn with_hybrid(mut self, use_hybrid: bool) -> Self {
        self.use_hybrid = use_hybrid;
        self
    }

    /// Builder: enable or disable reranking
    pub fn with_rerank(mut self, use_rerank: bool) -> Self {
        self.use_rerank = use_rerank;
        self
    }

    /// Builder: force expansion on or off (`None` follows config)
    pub fn with_expansion(mut self, expand: Option<bool>) -> Self {
        self.expand = expand;
        self
    }
}

/// Retrieval stage that can be skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Query expansion
    Expansion,
    /// Vector search
    VectorSearch,
    /// Reranking
    Rerank,
}

impl Stage {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Expansion => "expansion",
            Stage::VectorSearch => "vector_search",
            Stage::Rerank => "rerank",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage that was skipped, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    /// Skipped stage
    pub stage: Stage,
    /// Human-readable cause
    pub reason: String,
}

/// Receives every degradation as it happens (metrics hook)
pub trait DegradationObserver: Send + Sync {
    /// Called once per skipped stage
    fn on_degradation(&self, degradation: &Degradation);
}

/// Per-call statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveStats {
    /// Candidates requested from the lexical index
    pub lexical_fetch: usize,
    /// Candidates requested from the vector provider (0 if not asked)
    pub vector_fetch: usize,
    /// Candidates the lexical index returned
    pub lexical_candidates: usize,
    /// Candidates the vector provider returned
    pub vector_candidates: usize,
    /// Size of the fused list before filtering
    pub fused_candidates: usize,
    /// Generation of the index snapshot that served the call
    pub index_generation: u64,
    /// Query text used for search, when expansion changed it
    pub expanded_query: Option<String>,
    /// Whether the reranker reordered the final list
    pub reranked: bool,
    /// Wall time of the call
    pub elapsed_micros: u64,
}

/// Result of one retrieval call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrieveResponse {
    /// Ranked hits, at most `count`
    pub hits: Vec<SearchHit>,
    /// Stages that were skipped
    pub degradations: Vec<Degradation>,
    /// Execution statistics
    pub stats: RetrieveStats,
}

impl RetrieveResponse {
    /// Whether any stage was skipped
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    /// Whether a given stage was skipped
    pub fn degraded(&self, stage: Stage) -> bool {
        self.degradations.iter().any(|d| d.stage == stage)
    }
}

// ============================================================================
// Retriever
// ============================================================================

/// Hybrid retrieval orchestrator
///
/// Cheap to clone; clones share the index handle and collaborators.
/// Configuration is fixed at construction.
#[derive(Clone)]
pub struct Retriever {
    config: RetrievalConfig,
    policy: OversamplePolicy,
    index: Arc<IndexHandle>,
    fuser: Arc<dyn Fuser>,
    vector: Option<Arc<dyn VectorSearchProvider>>,
    expander: Option<Arc<dyn QueryExpander>>,
    reranker: Option<RerankerAdapter>,
    observer: Option<Arc<dyn DegradationObserver>>,
    lanes: StageLanes,
}

/// Worker lanes, one per external stage; shared by clones
#[derive(Debug, Clone)]
struct StageLanes {
    expansion: CallLane,
    vector: CallLane,
    rerank: CallLane,
}

impl StageLanes {
    fn from_config(config: &RetrievalConfig) -> Self {
        StageLanes {
            expansion: CallLane::new("expand", config.expansion.max_in_flight),
            vector: CallLane::new("vector", config.vector.max_in_flight),
            rerank: CallLane::new("rerank", config.rerank.max_in_flight),
        }
    }

    fn get(&self, stage: Stage) -> &CallLane {
        match stage {
            Stage::Expansion => &self.expansion,
            Stage::VectorSearch => &self.vector,
            Stage::Rerank => &self.rerank,
        }
    }
}

impl fmt::Debug for Retriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriever")
            .field("config", &self.config)
            .field("index_generation", &self.index.generation())
            .field("fuser", &self.fuser.name())
            .field("vector", &self.vector.as_ref().map(|v| v.name().to_string()))
            .field("expander", &self.expander.is_some())
            .field("reranker", &self.reranker)
            .finish()
    }
}

impl Retriever {
    /// Create a retriever with an empty index
    ///
    /// Fails with `InvalidInput` if `config` does not validate.
    pub fn new(config: RetrievalConfig) -> RetrievalResult<Self> {
        config.validate()?;
        let policy = config.oversample_policy()?;
        Ok(Retriever {
            index: Arc::new(IndexHandle::new(config.bm25_params())),
            fuser: Arc::new(RRFFuser::new(config.fusion.rrf_k)),
            policy,
            lanes: StageLanes::from_config(&config),
            config,
            vector: None,
            expander: None,
            reranker: None,
            observer: None,
        })
    }

    /// Builder: share an existing index handle
    pub fn with_index(mut self, index: Arc<IndexHandle>) -> Self {
        self.index = index;
        self
    }

    /// Builder: set custom fuser
    pub fn with_fuser(mut self, fuser: Arc<dyn Fuser>) -> Self {
        self.fuser = fuser;
        self
    }

    /// Builder: set vector search provider
    pub fn with_vector_provider(mut self, provider: Arc<dyn VectorSearchProvider>) -> Self {
        self.vector = Some(provider);
        self
    }

    /// Builder: set query expander
    pub fn with_expander(mut self, expander: Arc<dyn QueryExpander>) -> Self {
        self.expander = Some(expander);
        self
    }

    /// Builder: set rerank scorer, capped at `rerank.max_candidates`
    pub fn with_reranker(mut self, scorer: Arc<dyn RerankScorer>) -> Self {
        let adapter =
            RerankerAdapter::new(scorer).with_max_candidates(self.config.rerank.max_candidates);
        self.reranker = Some(adapter);
        self
    }

    /// Builder: set degradation observer
    pub fn with_observer(mut self, observer: Arc<dyn DegradationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Builder: install the API-backed expander and reranker from the
    /// `[model]` config section, if present
    pub fn with_configured_model(self) -> Self {
        let Some(model) = self.config.model.clone() else {
            return self;
        };
        let expander = ApiExpander::from_model_config(&model)
            .into_expander(self.config.expansion.max_expansions);
        let reranker = ApiReranker::from_model_config(&model);
        self.with_expander(Arc::new(expander))
            .with_reranker(Arc::new(reranker))
    }

    /// Configuration in effect
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Shared index handle
    pub fn index(&self) -> &Arc<IndexHandle> {
        &self.index
    }

    /// Live workers for `stage`, including ones abandoned after a timeout
    pub fn in_flight(&self, stage: Stage) -> usize {
        self.lanes.get(stage).in_flight()
    }

    /// Build a new index from `passages` and swap it in
    ///
    /// Safe to call while queries are in flight. On failure the previous
    /// snapshot keeps serving and the error is returned.
    pub fn rebuild_index(&self, passages: Vec<Passage>) -> RetrievalResult<u64> {
        self.index.rebuild(passages)
    }

    /// Request for `query` with the configured default count
    pub fn request(&self, query: impl Into<String>) -> RetrieveRequest {
        RetrieveRequest::new(query, self.config.retrieval.default_count)
    }

    /// Ranked `(id, score)` hits without the response envelope
    pub fn retrieve_hits(
        &self,
        query: &str,
        count: usize,
        filter: Option<&MetadataFilter>,
        use_hybrid: bool,
        use_rerank: bool,
    ) -> RetrievalResult<Vec<SearchHit>> {
        let mut request = RetrieveRequest::new(query, count)
            .with_hybrid(use_hybrid)
            .with_rerank(use_rerank);
        request.filter = filter.cloned();
        self.retrieve(&request).map(|r| r.hits)
    }

    // ========================================================================
    // Orchestration
    // ========================================================================

    /// Run one retrieval
    ///
    /// # Errors
    ///
    /// `IndexNotBuilt` before the first successful rebuild. Every other
    /// problem is reported through `RetrieveResponse::degradations`.
    pub fn retrieve(&self, request: &RetrieveRequest) -> RetrievalResult<RetrieveResponse> {
        let started = Instant::now();
        // One snapshot for the whole call
        let snapshot = self.index.load()?;

        let mut response = RetrieveResponse::default();
        response.stats.index_generation = snapshot.generation();
        let n = request.count;
        if n == 0 {
            response.stats.elapsed_micros = started.elapsed().as_micros() as u64;
            return Ok(response);
        }

        let filter = request.filter.as_ref().filter(|f| !f.is_empty());
        let mut degradations = Vec::new();

        // 1. Expansion
        let search_query = self.expand_query(request, &mut degradations);
        if search_query != request.query {
            response.stats.expanded_query = Some(search_query.clone());
        }

        // 2. Fetch plan
        let provider = if request.use_hybrid {
            if self.vector.is_none() {
                self.degrade(
                    &mut degradations,
                    Stage::VectorSearch,
                    "no vector search provider configured",
                );
            }
            self.vector.clone()
        } else {
            None
        };
        let native_filter = provider.as_ref().is_some_and(|p| p.supports_native_filter());
        let plan = self
            .policy
            .plan(n, filter.is_some(), provider.is_some(), native_filter);
        response.stats.lexical_fetch = plan.lexical;
        response.stats.vector_fetch = plan.vector;

        debug!(
            target: "retrieval::search",
            count = n,
            filtered = filter.is_some(),
            hybrid = provider.is_some(),
            lexical_fetch = plan.lexical,
            vector_fetch = plan.vector,
            generation = snapshot.generation(),
            "Retrieval plan"
        );

        // 3. Vector search in flight while the lexical search runs here
        let pending = provider.map(|provider| {
            let query = search_query.clone();
            let filter = filter.cloned();
            let count = plan.vector;
            self.lanes
                .vector
                .spawn(self.config.vector_timeout(), move || {
                    provider.search(&query, count, filter.as_ref())
                })
        });

        let lexical = snapshot.search(&search_query, plan.lexical);
        response.stats.lexical_candidates = lexical.len();

        let vector = match pending {
            None => None,
            Some(Err(e)) => {
                self.degrade(&mut degradations, Stage::VectorSearch, e.to_string());
                None
            }
            Some(Ok(call)) => match call.wait() {
                Ok(Ok(mut list)) => {
                    list.truncate(plan.vector);
                    Some(list)
                }
                Ok(Err(e)) => {
                    self.degrade(&mut degradations, Stage::VectorSearch, e.to_string());
                    None
                }
                Err(e) => {
                    self.degrade(&mut degradations, Stage::VectorSearch, e.to_string());
                    None
                }
            },
        };
        response.stats.vector_candidates = vector.as_ref().map_or(0, Vec::len);

        // 4. Fuse, or pass the single lexical list through
        let fused = self.fuse(lexical, vector);
        response.stats.fused_candidates = fused.len();

        // 5. Filter to N
        let filtered = match filter {
            Some(f) => filter_with_index(fused, f, n, snapshot.index()),
            None => {
                let mut fused = fused;
                fused.truncate(n);
                fused
            }
        };

        // 6. Rerank with the original query
        let ranked: Vec<(PassageId, f64)> = if request.use_rerank {
            match self.rerank(&request.query, &snapshot, &filtered, n, &mut degradations) {
                Some(reranked) => {
                    response.stats.reranked = true;
                    reranked
                }
                None => filtered.into_iter().map(|h| (h.id, h.score)).collect(),
            }
        } else {
            filtered.into_iter().map(|h| (h.id, h.score)).collect()
        };

        response.hits = ranked
            .into_iter()
            .take(n)
            .enumerate()
            .map(|(i, (id, score))| SearchHit::new(id, score, (i + 1) as u32))
            .collect();
        response.degradations = degradations;
        response.stats.elapsed_micros = started.elapsed().as_micros() as u64;

        debug!(
            target: "retrieval::search",
            hits = response.hits.len(),
            degraded = response.is_degraded(),
            elapsed_us = response.stats.elapsed_micros,
            "Retrieval complete"
        );
        Ok(response)
    }

    fn expand_query(
        &self,
        request: &RetrieveRequest,
        degradations: &mut Vec<Degradation>,
    ) -> String {
        let query = &request.query;
        if !request.expand.unwrap_or(self.config.expansion.enabled) {
            return query.clone();
        }
        let Some(expander) = self.expander.clone() else {
            if request.expand == Some(true) {
                self.degrade(degradations, Stage::Expansion, "no query expander configured");
            }
            return query.clone();
        };
        if query.split_whitespace().count() < self.config.expansion.min_query_words {
            return query.clone();
        }

        let owned = query.clone();
        let outcome = self
            .lanes
            .expansion
            .call(self.config.expansion_timeout(), move || expander.expand(&owned));
        match outcome {
            Ok(Ok(expanded)) if !expanded.trim().is_empty() => expanded,
            Ok(Ok(_)) => query.clone(),
            Ok(Err(e)) => {
                self.degrade(degradations, Stage::Expansion, e.to_string());
                query.clone()
            }
            Err(e) => {
                self.degrade(degradations, Stage::Expansion, e.to_string());
                query.clone()
            }
        }
    }

    fn fuse(&self, lexical: Vec<Candidate>, vector: Option<Vec<Candidate>>) -> Vec<FusedHit> {
        match vector {
            Some(vector) => {
                let weights = &self.config.fusion;
                self.fuser.fuse_weighted(&[
                    (&lexical, weights.lexical_weight),
                    (&vector, weights.vector_weight),
                ])
            }
            None => pass_through(lexical),
        }
    }

    /// Reranked `(id, relevance)` list, or `None` to keep the incoming order
    fn rerank(
        &self,
        query: &str,
        snapshot: &IndexSnapshot,
        hits: &[FusedHit],
        n: usize,
        degradations: &mut Vec<Degradation>,
    ) -> Option<Vec<(PassageId, f64)>> {
        let Some(adapter) = self.reranker.clone() else {
            self.degrade(degradations, Stage::Rerank, "no reranker configured");
            return None;
        };
        if hits.is_empty() {
            return None;
        }

        let candidates: Vec<RerankCandidate> = hits
            .iter()
            .map(|h| {
                let text = snapshot
                    .passage(&h.id)
                    .map(|p| p.text.clone())
                    .unwrap_or_default();
                RerankCandidate::new(h.id.clone(), text, h.score)
            })
            .collect();

        let owned = query.to_string();
        let outcome = self
            .lanes
            .rerank
            .call(self.config.rerank_timeout(), move || {
                adapter.rerank(&owned, candidates, n)
            });
        match outcome {
            Ok(Ok(reranked)) => Some(reranked.into_iter().map(|c| (c.id, c.score)).collect()),
            Ok(Err(e)) => {
                self.degrade(degradations, Stage::Rerank, e.to_string());
                None
            }
            Err(e) => {
                self.degrade(degradations, Stage::Rerank, e.to_string());
                None
            }
        }
    }

    fn degrade(
        &self,
        degradations: &mut Vec<Degradation>,
        stage: Stage,
        reason: impl Into<String>,
    ) {
        let degradation = Degradation {
            stage,
            reason: reason.into(),
        };
        warn!(
            target: "retrieval::search",
            stage = %degradation.stage,
            reason = %degradation.reason,
            "Retrieval stage skipped"
        );
        if let Some(observer) = &self.observer {
            observer.on_degradation(&degradation);
        }
        degradations.push(degradation);
    }
}

// ============================================================================
// Tests
// ============================================================================
