//! End-to-end scenarios on P1 "solar panel efficiency", P2 "wind turbine
//! blade", P3 "solar battery storage"

use crate::common::*;
use hybrid_retrieval::{
    Fuser, MetadataFilter, PassageId, RRFFuser, RerankError, RerankScorer, RetrieveRequest,
    Stage, StaticVectorProvider,
};
use std::sync::Arc;
use std::time::Duration;

struct TimedOutScorer;

impl RerankScorer for TimedOutScorer {
    fn score(
        &self,
        _query: &str,
        _passages: &[(PassageId, &str)],
    ) -> Result<Vec<(PassageId, f64)>, RerankError> {
        std::thread::sleep(Duration::from_millis(300));
        Err(RerankError::Timeout)
    }
}

#[test]
fn lexical_only_solar_returns_p1_p3() {
    let retriever = energy_retriever();
    let hits = retriever
        .retrieve_hits("solar", 2, None, false, false)
        .unwrap();

    assert_eq!(ids(&hits), vec!["P1", "P3"]);
    // Same length, same tf: tie broken by id
    assert_eq!(hits[0].score, hits[1].score);
    assert!(hits[0].score > 0.0);
}

#[test]
fn hybrid_fusion_exact_arithmetic() {
    let retriever = energy_retriever()
        .with_vector_provider(Arc::new(StaticVectorProvider::from_ids(["P2", "P1", "P3"])));
    let response = retriever.retrieve(&RetrieveRequest::new("solar", 3)).unwrap();

    let p1 = 1.0 / 61.0 + 1.0 / 62.0;
    let p2 = 1.0 / 61.0;
    let p3 = 1.0 / 62.0 + 1.0 / 63.0;
    assert!(p1 > p3 && p3 > p2);

    assert_eq!(ids(&response.hits), vec!["P1", "P3", "P2"]);
    let scores: Vec<f64> = response.hits.iter().map(|h| h.score).collect();
    for (got, want) in scores.iter().zip([p1, p3, p2]) {
        assert!((got - want).abs() < 1e-12, "{} != {}", got, want);
    }
    assert_eq!(response.stats.lexical_candidates, 2);
    assert_eq!(response.stats.vector_candidates, 3);
    assert_eq!(response.stats.fused_candidates, 3);
}

#[test]
fn fusion_engine_alone_matches_orchestrator() {
    let snapshot = energy_retriever().index().load().unwrap();
    let lexical = snapshot.search("solar", 3);
    let vector = StaticVectorProvider::from_ids(["P2", "P1", "P3"]);
    let vector = hybrid_retrieval::VectorSearchProvider::search(&vector, "solar", 3, None).unwrap();

    let fused = RRFFuser::default().fuse(&[&lexical, &vector]);
    assert_eq!(ids(&fused), vec!["P1", "P3", "P2"]);
    assert_eq!(fused[2].best_rank, 1);
}

#[test]
fn filter_drops_wind_regardless_of_fusion_rank() {
    let retriever = energy_retriever()
        .with_vector_provider(Arc::new(StaticVectorProvider::from_ids(["P2", "P1", "P3"])));
    let request =
        RetrieveRequest::new("solar", 3).with_filter(MetadataFilter::new().eq("topic", "solar"));
    let response = retriever.retrieve(&request).unwrap();

    assert_eq!(ids(&response.hits), vec!["P1", "P3"]);
    // Under-fulfillment is a short list, not an error
    assert!(response.hits.len() < 3);
    assert!(!response.is_degraded());
    assert_eq!(response.stats.lexical_fetch, 9);
}

#[test]
fn parsed_filter_matches_builder_filter() {
    let retriever = energy_retriever();
    let parsed = MetadataFilter::parse("topic=solar").unwrap();
    let built = MetadataFilter::new().eq("topic", "solar");
    assert_eq!(
        retriever.retrieve_hits("solar wind", 3, Some(&parsed), false, false).unwrap(),
        retriever.retrieve_hits("solar wind", 3, Some(&built), false, false).unwrap()
    );
}

#[test]
fn malformed_filter_is_precondition_error() {
    let err = MetadataFilter::parse("topic").unwrap_err();
    assert!(err.is_precondition());
}

#[test]
fn reranker_timeout_keeps_pre_rerank_order() {
    let retriever = energy_retriever()
        .with_vector_provider(Arc::new(StaticVectorProvider::from_ids(["P2", "P1", "P3"])))
        .with_reranker(Arc::new(TimedOutScorer));
    let request = RetrieveRequest::new("solar", 3).with_rerank(true);

    let response = retriever.retrieve(&request).unwrap();
    assert_eq!(ids(&response.hits), vec!["P1", "P3", "P2"]);
    assert!(response.degraded(Stage::Rerank));
    assert!(!response.stats.reranked);
}

#[test]
fn empty_query_is_empty_lexical_not_error() {
    let retriever = energy_retriever();
    let hits = retriever.retrieve_hits("", 3, None, false, false).unwrap();
    assert!(hits.is_empty());

    let hits = retriever.retrieve_hits("   ", 3, None, false, false).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn empty_query_hybrid_fuses_vector_alone() {
    let retriever =
        energy_retriever().with_vector_provider(Arc::new(FixedProvider(vec!["P2", "P3"])));
    let response = retriever.retrieve(&RetrieveRequest::new("", 3)).unwrap();

    assert_eq!(response.stats.lexical_candidates, 0);
    assert_eq!(ids(&response.hits), vec!["P2", "P3"]);
    assert!((response.hits[0].score - 1.0 / 61.0).abs() < 1e-12);
    assert!(!response.is_degraded());
}

#[test]
fn stalled_vector_search_degrades_within_deadline() {
    let stalled = StalledProvider(Duration::from_secs(2));
    let retriever = energy_retriever().with_vector_provider(Arc::new(stalled));
    let started = std::time::Instant::now();
    let response = retriever.retrieve(&RetrieveRequest::new("solar", 2)).unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(ids(&response.hits), vec!["P1", "P3"]);
    assert!(response.degraded(Stage::VectorSearch));
}

#[test]
fn query_terms_absent_from_corpus() {
    let retriever = energy_retriever();
    assert!(retriever
        .retrieve_hits("geothermal", 3, None, false, false)
        .unwrap()
        .is_empty());
}
