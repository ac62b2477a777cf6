//! Loading a retriever from `retrieval.toml`

use crate::common::*;
use hybrid_retrieval::{RetrievalConfig, Retriever, StaticVectorProvider, CONFIG_FILE_NAME};
use std::sync::Arc;

#[test]
fn retriever_from_written_default_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    RetrievalConfig::write_default_if_missing(&path).unwrap();

    let config = RetrievalConfig::from_file(&path).unwrap();
    let retriever = Retriever::new(config).unwrap();
    retriever.rebuild_index(energy_corpus()).unwrap();
    assert_eq!(retriever.request("solar").count, 5);
}

#[test]
fn rrf_k_from_file_changes_fused_scores() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[fusion]\nrrf_k = 10\n").unwrap();

    let retriever = Retriever::new(RetrievalConfig::from_file(&path).unwrap())
        .unwrap()
        .with_vector_provider(Arc::new(StaticVectorProvider::from_ids(["P2", "P1", "P3"])));
    retriever.rebuild_index(energy_corpus()).unwrap();

    let hits = retriever.retrieve_hits("solar", 3, None, true, false).unwrap();
    assert!((hits[0].score - (1.0 / 11.0 + 1.0 / 12.0)).abs() < 1e-12);
}

#[test]
fn bm25_params_from_file_reach_the_index() {
    let config = RetrievalConfig::from_toml_str("[bm25]\nk1 = 1.2\nb = 0.5\n").unwrap();
    let retriever = Retriever::new(config).unwrap();
    retriever.rebuild_index(energy_corpus()).unwrap();
    let params = retriever.index().load().unwrap().params();
    assert_eq!((params.k1, params.b), (1.2, 0.5));
}
