//! Hybrid passage retrieval
//!
//! Keyword (BM25) and vector search fused with Reciprocal Rank Fusion,
//! post-filtered on passage metadata and optionally reranked.
//!
//! # Quick Start
//!
//! ```
//! use hybrid_retrieval::{MetadataFilter, Passage, RetrievalConfig, RetrieveRequest, Retriever};
//!
//! let retriever = Retriever::new(RetrievalConfig::default())?;
//! retriever.rebuild_index(vec![
//!     Passage::new("P1", "solar panel efficiency").with_meta("topic", "solar"),
//!     Passage::new("P2", "wind turbine blade").with_meta("topic", "wind"),
//! ])?;
//!
//! let request = RetrieveRequest::new("solar panel", 5)
//!     .with_hybrid(false)
//!     .with_filter(MetadataFilter::parse("topic=solar")?);
//! let response = retriever.retrieve(&request)?;
//! assert_eq!(response.hits[0].id.as_str(), "P1");
//! # Ok::<(), hybrid_retrieval::RetrievalError>(())
//! ```
//!
//! # Architecture
//!
//! - `retrieval-core`: passages, candidates, filters, errors
//! - `retrieval-search`: tokenizer, BM25 index, snapshot swap, fusion, filtering
//! - `retrieval-intelligence`: collaborators, configuration, the `Retriever`

pub use retrieval_core::{
    assign_ranks, Candidate, FusedHit, MetadataFilter, Passage, PassageId, RetrievalError,
    RetrievalResult, SearchHit,
};
pub use retrieval_intelligence::{
    hit_rate_at_k, rank_scored, reciprocal_rank_at_k, ApiExpander, ApiReranker, CallError, CallLane,
    ChatEndpoint, CompletionModel, Degradation, DegradationObserver, EvaluationQuery,
    EvaluationReport, ExpandError, ExpansionDetails, ModelConfig, QueryExpander, RerankCandidate,
    RerankError, RerankScorer, RerankerAdapter, RetrievalConfig, RetrieveRequest, RetrieveResponse,
    RetrieveStats, Retriever, ScoreOrder, Stage, StaticVectorProvider, TermListExpander,
    VectorSearchError, VectorSearchProvider, CONFIG_FILE_NAME,
};
pub use retrieval_search::{
    filter_ranked, filter_with_index, tokenize, Bm25Params, Bm25Scorer, FetchPlan, Fuser,
    IndexHandle, IndexSnapshot, LexicalIndex, OversamplePolicy, RRFFuser, ScorerContext,
};

/// Full lexical search API
pub use retrieval_search as search;

/// Full orchestration API (deadline runner, LLM client, evaluation details)
pub use retrieval_intelligence as intelligence;
