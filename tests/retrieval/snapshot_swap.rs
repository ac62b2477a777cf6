//! Rebuilds under concurrent queries

use crate::common::*;
use hybrid_retrieval::{Passage, RetrievalConfig, RetrievalError, RetrieveRequest, Retriever};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn corpus(word: &str, n: usize) -> Vec<Passage> {
    (0..n)
        .map(|i| Passage::new(format!("{}-{:03}", word, i), format!("{} grid storage", word)))
        .collect()
}

#[test]
fn query_sees_whole_old_or_whole_new_index() {
    init_tracing();
    let retriever = Retriever::new(RetrievalConfig::default()).unwrap();
    retriever.rebuild_index(corpus("alpha", 40)).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let retriever = retriever.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut checked = 0usize;
                while !done.load(Ordering::Acquire) || checked == 0 {
                    let request = RetrieveRequest::new("grid", 100).with_hybrid(false);
                    let response = retriever.retrieve(&request).unwrap();
                    let count = |prefix: &str| {
                        response
                            .hits
                            .iter()
                            .filter(|h| h.id.as_str().starts_with(prefix))
                            .count()
                    };
                    let (alpha, beta) = (count("alpha"), count("beta"));
                    let generation = response.stats.index_generation;
                    // Odd generations hold alpha (40), even hold beta (25)
                    if generation % 2 == 1 {
                        assert_eq!((alpha, beta), (40, 0), "generation {}", generation);
                    } else {
                        assert_eq!((alpha, beta), (0, 25), "generation {}", generation);
                    }
                    checked += 1;
                }
                checked
            })
        })
        .collect();

    for i in 0..30 {
        let next = if i % 2 == 0 { corpus("beta", 25) } else { corpus("alpha", 40) };
        retriever.rebuild_index(next).unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(retriever.index().generation(), 31);
}

#[test]
fn failed_rebuild_keeps_serving_previous_snapshot() {
    let retriever = energy_retriever();
    let before = retriever.retrieve_hits("solar", 3, None, false, false).unwrap();

    let duplicate = vec![Passage::new("P1", "first"), Passage::new("P1", "second")];
    let err = retriever.rebuild_index(duplicate).unwrap_err();
    assert!(err.is_corruption());

    assert_eq!(retriever.index().generation(), 1);
    assert_eq!(retriever.retrieve_hits("solar", 3, None, false, false).unwrap(), before);
}

#[test]
fn query_before_first_build_fails() {
    let retriever = Retriever::new(RetrievalConfig::default()).unwrap();
    assert_eq!(
        retriever.retrieve(&RetrieveRequest::new("solar", 3)).unwrap_err(),
        RetrievalError::IndexNotBuilt
    );
}
