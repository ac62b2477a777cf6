//! Atomically swappable index snapshots
//!
//! Queries grab the current snapshot (`Arc` clone under a short read lock)
//! and keep using it for the whole request. A rebuild constructs the new
//! index with no lock held, then publishes it with a single pointer swap.
//! An in-flight query therefore sees either the old or the new index in
//! full. A failed build never replaces the live snapshot.

use crate::index::LexicalIndex;
use crate::scorer::Bm25Params;
use parking_lot::RwLock;
use retrieval_core::{Passage, RetrievalError, RetrievalResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// A published, immutable index together with its generation number
#[derive(Debug)]
pub struct IndexSnapshot {
    index: LexicalIndex,
    generation: u64,
}

impl IndexSnapshot {
    /// The index held by this snapshot
    pub fn index(&self) -> &LexicalIndex {
        &self.index
    }

    /// Generation this snapshot was published as (starts at 1)
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::ops::Deref for IndexSnapshot {
    type Target = LexicalIndex;

    fn deref(&self) -> &LexicalIndex {
        &self.index
    }
}

/// Holder of the live index snapshot
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Option<Arc<IndexSnapshot>>>,
    generation: AtomicU64,
    params: Bm25Params,
}

impl Default for IndexHandle {
    fn default() -> Self {
        Self::new(Bm25Params::default())
    }
}

impl IndexHandle {
    /// Create an empty handle; queries fail with `IndexNotBuilt` until the
    /// first successful rebuild.
    pub fn new(params: Bm25Params) -> Self {
        IndexHandle {
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
            params,
        }
    }

    /// Create a handle and build its first snapshot
    pub fn with_corpus(passages: Vec<Passage>, params: Bm25Params) -> RetrievalResult<Self> {
        let handle = Self::new(params);
        handle.rebuild(passages)?;
        Ok(handle)
    }

    /// Current snapshot
    pub fn load(&self) -> RetrievalResult<Arc<IndexSnapshot>> {
        self.current
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(RetrievalError::IndexNotBuilt)
    }

    /// Build a new index from `passages` and publish it
    ///
    /// Returns the generation of the published snapshot. On failure the
    /// previously published snapshot (if any) stays live and the error is
    /// returned.
    pub fn rebuild(&self, passages: Vec<Passage>) -> RetrievalResult<u64> {
        let index = match LexicalIndex::build(passages, self.params) {
            Ok(index) => index,
            Err(e) => {
                warn!(
                    target: "retrieval::index",
                    error = %e,
                    live_generation = self.generation(),
                    "Index rebuild failed, keeping previous snapshot"
                );
                return Err(e);
            }
        };
        Ok(self.publish(index))
    }

    /// Publish an already-built index
    pub fn publish(&self, index: LexicalIndex) -> u64 {
        let documents = index.total_docs();
        let mut slot = self.current.write();
        // Bumped under the write lock so generations are published in order
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        *slot = Some(Arc::new(IndexSnapshot { index, generation }));
        drop(slot);

        info!(
            target: "retrieval::index",
            generation,
            documents,
            "Index snapshot published"
        );
        generation
    }

    /// Generation of the live snapshot (0 before the first build)
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Check if a snapshot has been published
    pub fn is_built(&self) -> bool {
        self.current.read().is_some()
    }

    /// BM25 parameters used for every build through this handle
    pub fn params(&self) -> Bm25Params {
        self.params
    }
}
