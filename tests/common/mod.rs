//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use hybrid_retrieval::{
    Candidate, MetadataFilter, Passage, RetrievalConfig, Retriever, VectorSearchError,
    VectorSearchProvider,
};
use std::sync::Once;
use std::time::Duration;

static INIT_TRACING: Once = Once::new();

/// Install a test subscriber once; honors RUST_LOG
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// P1 "solar panel efficiency", P2 "wind turbine blade", P3 "solar battery storage"
pub fn energy_corpus() -> Vec<Passage> {
    vec![
        Passage::new("P1", "solar panel efficiency").with_meta("topic", "solar"),
        Passage::new("P2", "wind turbine blade").with_meta("topic", "wind"),
        Passage::new("P3", "solar battery storage").with_meta("topic", "solar"),
    ]
}

/// Short deadlines so timeout paths finish quickly
pub fn fast_config() -> RetrievalConfig {
    let mut config = RetrievalConfig::default();
    config.vector.timeout_ms = 100;
    config.rerank.timeout_ms = 50;
    config.expansion.timeout_ms = 50;
    config
}

/// Retriever over the energy corpus
pub fn energy_retriever() -> Retriever {
    init_tracing();
    let retriever = Retriever::new(fast_config()).expect("valid config");
    retriever.rebuild_index(energy_corpus()).expect("corpus builds");
    retriever
}

/// Ids of a hit list
pub fn ids<T: HasId>(hits: &[T]) -> Vec<String> {
    hits.iter().map(|h| h.id_str().to_string()).collect()
}

/// Anything carrying a passage id
pub trait HasId {
    fn id_str(&self) -> &str;
}

impl HasId for hybrid_retrieval::SearchHit {
    fn id_str(&self) -> &str {
        self.id.as_str()
    }
}

impl HasId for hybrid_retrieval::FusedHit {
    fn id_str(&self) -> &str {
        self.id.as_str()
    }
}

impl HasId for Candidate {
    fn id_str(&self) -> &str {
        self.id.as_str()
    }
}

/// Provider that returns results for any query, even an empty one
pub struct FixedProvider(pub Vec<&'static str>);

impl VectorSearchProvider for FixedProvider {
    fn search(
        &self,
        _query: &str,
        count: usize,
        _filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Candidate>, VectorSearchError> {
        Ok(self
            .0
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, id)| Candidate::new(*id, 1.0 - i as f64 * 0.1, (i + 1) as u32))
            .collect())
    }
}

/// Provider that never answers within a test deadline
pub struct StalledProvider(pub Duration);

impl VectorSearchProvider for StalledProvider {
    fn search(
        &self,
        _query: &str,
        _count: usize,
        _filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Candidate>, VectorSearchError> {
        std::thread::sleep(self.0);
        Ok(Vec::new())
    }
}
