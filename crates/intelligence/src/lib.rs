//! Retrieval orchestration
//!
//! Everything above the lexical index: the external collaborators
//! (vector search, query expansion, reranking), the deadline runner that
//! bounds them, configuration, and the `Retriever` that sequences a query.
//!
//! This crate provides:
//! - `Retriever` / `RetrieveRequest` / `RetrieveResponse`
//! - `VectorSearchProvider` trait and `StaticVectorProvider`
//! - `QueryExpander` trait, `TermListExpander`, `ApiExpander` (feature `expand`)
//! - `RerankScorer` trait, `RerankerAdapter`, `ApiReranker` (feature `rerank`)
//! - `RetrievalConfig` loaded from `retrieval.toml`
//! - Hit rate / MRR evaluation
//!
//! # Usage
//!
//! ```
//! use retrieval_intelligence::{RetrievalConfig, RetrieveRequest, Retriever, StaticVectorProvider};
//! use retrieval_core::Passage;
//! use std::sync::Arc;
//!
//! let retriever = Retriever::new(RetrievalConfig::default())
//!     .unwrap()
//!     .with_vector_provider(Arc::new(StaticVectorProvider::from_ids(["P2", "P1"])));
//! retriever
//!     .rebuild_index(vec![
//!         Passage::new("P1", "solar panel efficiency"),
//!         Passage::new("P2", "wind turbine blade"),
//!     ])
//!     .unwrap();
//!
//! let response = retriever.retrieve(&RetrieveRequest::new("solar", 2)).unwrap();
//! assert_eq!(response.hits[0].id.as_str(), "P1");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod deadline;
pub mod evaluation;
pub mod expand;
pub mod llm_client;
pub mod rerank;
pub mod retriever;
pub mod vector;

pub use config::{ModelConfig, RetrievalConfig, CONFIG_FILE_NAME};
pub use deadline::{call_with_deadline, spawn_call, CallError, CallLane, PendingCall};
pub use evaluation::{
    hit_rate_at_k, reciprocal_rank_at_k, EvaluationQuery, EvaluationReport, QueryOutcome,
    Relevance,
};
pub use expand::{
    ApiExpander, CompletionModel, ExpandError, ExpansionDetails, QueryExpander, TermListExpander,
};
pub use llm_client::{ChatEndpoint, LlmClientError};
pub use rerank::{ApiReranker, RerankCandidate, RerankError, RerankScorer, RerankerAdapter};
pub use retriever::{
    Degradation, DegradationObserver, RetrieveRequest, RetrieveResponse, RetrieveStats,
    Retriever, Stage,
};
pub use vector::{
    rank_scored, ScoreOrder, StaticVectorProvider, VectorSearchError, VectorSearchProvider,
};
