//! Scoring, fusion, filtering and oversampling invariants

use hybrid_retrieval::{
    assign_ranks, filter_ranked, Bm25Params, Bm25Scorer, Candidate, FusedHit, Fuser,
    MetadataFilter, OversamplePolicy, PassageId, RRFFuser, ScorerContext,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn ranked(ids: &[String]) -> Vec<Candidate> {
    assign_ranks(
        ids.iter()
            .enumerate()
            .map(|(i, id)| (PassageId::from(id.as_str()), (ids.len() - i) as f64)),
    )
}

fn distinct_ids(max: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::hash_set("[a-z]{1,5}", 0..max).prop_map(|s| {
        let mut v: Vec<String> = s.into_iter().collect();
        v.sort();
        v
    })
}

proptest! {
    #[test]
    fn bm25_non_decreasing_in_tf(
        total in 1usize..10_000,
        avg in 1.0f64..500.0,
        df_frac in 0.0f64..1.0,
        tf in 1u32..200,
        len in 1u32..2_000,
    ) {
        let ctx = ScorerContext::new(total, avg);
        let scorer = Bm25Scorer::new(Bm25Params::default(), &ctx);
        let idf = ctx.idf(((total as f64) * df_frac) as usize);
        prop_assert!(scorer.term_score(idf, tf + 1, len) >= scorer.term_score(idf, tf, len));
    }

    #[test]
    fn bm25_non_increasing_in_doc_len(
        total in 1usize..10_000,
        avg in 1.0f64..500.0,
        tf in 1u32..200,
        len in 1u32..2_000,
        extra in 1u32..500,
    ) {
        let ctx = ScorerContext::new(total, avg);
        let scorer = Bm25Scorer::new(Bm25Params::default(), &ctx);
        let idf = ctx.idf(1);
        prop_assert!(scorer.term_score(idf, tf, len + extra) <= scorer.term_score(idf, tf, len));
    }

    #[test]
    fn self_fusion_keeps_order(ids in distinct_ids(30)) {
        let list = ranked(&ids);
        let fused = RRFFuser::default().fuse(&[&list, &list]);
        let order: Vec<&str> = fused.iter().map(|h| h.id.as_str()).collect();
        let expected: Vec<&str> = ids.iter().map(String::as_str).collect();
        prop_assert_eq!(order, expected);
    }

    #[test]
    fn presence_in_both_lists_scores_higher(
        ids in distinct_ids(20),
        pos_a in 0usize..20,
        pos_b in 0usize..20,
    ) {
        prop_assume!(!ids.is_empty());
        let target = ids[pos_a % ids.len()].clone();
        let list_a = ranked(&ids);

        // Same second list with and without the target
        let mut with: Vec<String> = ids.iter().rev().cloned().collect();
        let without: Vec<String> = with.iter().filter(|id| **id != target).cloned().collect();
        let at = with.iter().position(|id| *id == target).unwrap();
        let moved = with.remove(at);
        with.insert(pos_b % (with.len() + 1), moved);

        let fuser = RRFFuser::default();
        let score_of = |hits: &[FusedHit]| {
            hits.iter().find(|h| h.id.as_str() == target).map(|h| h.score).unwrap()
        };
        let both = score_of(&fuser.fuse(&[&list_a, &ranked(&with)]));
        let one = score_of(&fuser.fuse(&[&list_a, &ranked(&without)]));
        prop_assert!(both > one);
    }

    #[test]
    fn filtering_is_an_order_preserving_subsequence(
        ids in distinct_ids(30),
        topics in proptest::collection::vec(prop_oneof!["solar", "wind"], 30),
        limit in 0usize..40,
    ) {
        let hits: Vec<FusedHit> = ranked(&ids).into_iter().map(FusedHit::from).collect();
        let meta: HashMap<PassageId, HashMap<String, String>> = ids
            .iter()
            .zip(&topics)
            .map(|(id, t)| {
                let mut m = HashMap::new();
                m.insert("topic".to_string(), t.to_string());
                (PassageId::from(id.as_str()), m)
            })
            .collect();
        let filter = MetadataFilter::new().eq("topic", "solar");

        let out = filter_ranked(hits.clone(), &filter, limit, |id| meta.get(id));
        prop_assert!(out.len() <= limit);

        // Subsequence check
        let mut cursor = hits.iter();
        for kept in &out {
            prop_assert!(cursor.any(|h| h.id == kept.id));
            prop_assert_eq!(meta[&kept.id]["topic"].as_str(), "solar");
        }

        // Nothing skipped before the limit was reached
        let all_matches = hits.iter().filter(|h| meta[&h.id]["topic"] == "solar").count();
        prop_assert_eq!(out.len(), all_matches.min(limit));
    }

    #[test]
    fn oversampling_requests_at_least_n_times_m(
        n in 0usize..1_000,
        m in 1usize..10,
        headroom in 1usize..10,
        hybrid in any::<bool>(),
    ) {
        let plan = OversamplePolicy::new(m, headroom).unwrap().plan(n, true, hybrid, false);
        prop_assert!(plan.lexical >= n * m);
        if hybrid {
            prop_assert!(plan.vector >= n * m);
        }
    }
}
