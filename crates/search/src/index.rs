//! Immutable lexical index
//!
//! This module provides:
//! - PostingEntry / PostingList: per-term document occurrences
//! - LexicalIndex: term statistics plus the passages they were built from
//!
//! # Architectural Rules
//!
//! - An index is built in one pass from the full corpus and never mutated
//!   afterwards. Rebuilding produces a new index (see `snapshot`).
//! - Doc ids are compact `u32` positions in corpus order, resolved back to
//!   `PassageId` through the stored passages.

use crate::scorer::{Bm25Params, Bm25Scorer, ScorerContext};
use crate::tokenizer::tokenize;
use retrieval_core::{assign_ranks, Candidate, Passage, PassageId, RetrievalError, RetrievalResult};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, info};

// ============================================================================
// PostingEntry
// ============================================================================

/// Entry in a posting list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingEntry {
    /// Compact document id (position in the corpus)
    pub doc_id: u32,
    /// Term frequency in this document
    pub tf: u32,
}

// ============================================================================
// PostingList
// ============================================================================

/// List of documents containing a term, in ascending doc_id order
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    /// Document entries
    pub entries: Vec<PostingEntry>,
}

impl PostingList {
    /// Add an entry to the posting list
    pub fn add(&mut self, entry: PostingEntry) {
        self.entries.push(entry);
    }

    /// Number of documents containing this term
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if posting list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// ScoredDocId
// ============================================================================

/// Intermediate scoring result before doc ids are resolved
#[derive(Debug, Clone, Copy)]
struct ScoredDocId {
    doc_id: u32,
    score: f64,
}

// ============================================================================
// LexicalIndex
// ============================================================================

/// BM25 index over a fixed corpus
///
/// # Thread Safety
///
/// Immutable after `build`, so any number of threads may search the same
/// index concurrently without locking.
#[derive(Debug)]
pub struct LexicalIndex {
    /// Corpus in build order; position == doc_id
    passages: Vec<Passage>,

    /// PassageId -> doc_id
    id_to_doc: FxHashMap<PassageId, u32>,

    /// Term -> postings
    postings: FxHashMap<String, PostingList>,

    /// Token count per doc_id
    doc_lens: Vec<u32>,

    /// Sum of all document lengths
    total_doc_len: u64,

    /// N and avgdl
    ctx: ScorerContext,

    params: Bm25Params,
}

impl LexicalIndex {
    /// Build an index over `passages`
    ///
    /// Fails with `InvalidInput` for bad BM25 parameters and with
    /// `Corruption` when the corpus repeats a passage id or the resulting
    /// statistics do not check out.
    pub fn build(passages: Vec<Passage>, params: Bm25Params) -> RetrievalResult<Self> {
        params.validate()?;
        let started = Instant::now();

        if passages.len() > u32::MAX as usize {
            return Err(RetrievalError::invalid_input(format!(
                "corpus of {} passages exceeds the index capacity",
                passages.len()
            )));
        }

        let mut id_to_doc: FxHashMap<PassageId, u32> = FxHashMap::default();
        id_to_doc.reserve(passages.len());
        let mut postings: FxHashMap<String, PostingList> = FxHashMap::default();
        let mut doc_lens = Vec::with_capacity(passages.len());
        let mut total_doc_len: u64 = 0;

        for (pos, passage) in passages.iter().enumerate() {
            let doc_id = pos as u32;
            if id_to_doc.insert(passage.id.clone(), doc_id).is_some() {
                return Err(RetrievalError::corruption(format!(
                    "duplicate passage id '{}'",
                    passage.id
                )));
            }

            let tokens = tokenize(&passage.text);
            let doc_len = u32::try_from(tokens.len()).map_err(|_| {
                RetrievalError::invalid_input(format!(
                    "passage '{}' has too many tokens",
                    passage.id
                ))
            })?;

            // Count term frequencies
            let mut tf_map: FxHashMap<String, u32> = FxHashMap::default();
            for token in tokens {
                *tf_map.entry(token).or_insert(0) += 1;
            }

            for (term, tf) in tf_map {
                postings.entry(term).or_default().add(PostingEntry { doc_id, tf });
            }

            doc_lens.push(doc_len);
            total_doc_len += doc_len as u64;
        }

        let total_docs = passages.len();
        let avg_doc_len = if total_docs == 0 {
            0.0
        } else {
            total_doc_len as f64 / total_docs as f64
        };

        let index = LexicalIndex {
            passages,
            id_to_doc,
            postings,
            doc_lens,
            total_doc_len,
            ctx: ScorerContext::new(total_docs, avg_doc_len),
            params,
        };
        index.check_consistency()?;

        info!(
            target: "retrieval::index",
            documents = total_docs,
            terms = index.postings.len(),
            avg_doc_len,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Lexical index built"
        );

        Ok(index)
    }

    /// Verify the term statistics against the stored documents
    ///
    /// Checks that every posting references a known document, that each
    /// term's document frequency equals its number of distinct documents,
    /// and that per-document term frequencies add up to the document length.
    pub fn check_consistency(&self) -> RetrievalResult<()> {
        let total_docs = self.passages.len();
        if self.doc_lens.len() != total_docs || self.id_to_doc.len() != total_docs {
            return Err(RetrievalError::corruption(format!(
                "document tables disagree: {} passages, {} lengths, {} ids",
                total_docs,
                self.doc_lens.len(),
                self.id_to_doc.len()
            )));
        }

        let mut tf_sums = vec![0u64; total_docs];
        for (term, list) in &self.postings {
            if list.is_empty() {
                return Err(RetrievalError::corruption(format!(
                    "term '{}' has an empty posting list",
                    term
                )));
            }
            let mut prev: Option<u32> = None;
            for entry in &list.entries {
                let Some(sum) = tf_sums.get_mut(entry.doc_id as usize) else {
                    return Err(RetrievalError::corruption(format!(
                        "term '{}' references unknown doc {}",
                        term, entry.doc_id
                    )));
                };
                if prev.is_some_and(|p| p >= entry.doc_id) {
                    return Err(RetrievalError::corruption(format!(
                        "term '{}' lists doc {} out of order or twice",
                        term, entry.doc_id
                    )));
                }
                if entry.tf == 0 {
                    return Err(RetrievalError::corruption(format!(
                        "term '{}' has zero frequency in doc {}",
                        term, entry.doc_id
                    )));
                }
                *sum += entry.tf as u64;
                prev = Some(entry.doc_id);
            }
        }

        for (doc_id, (&sum, &len)) in tf_sums.iter().zip(&self.doc_lens).enumerate() {
            if sum != len as u64 {
                return Err(RetrievalError::corruption(format!(
                    "doc {} has length {} but term frequencies sum to {}",
                    doc_id, len, sum
                )));
            }
        }

        let len_sum: u64 = self.doc_lens.iter().map(|&l| l as u64).sum();
        if len_sum != self.total_doc_len {
            return Err(RetrievalError::corruption(format!(
                "total document length {} does not match sum {}",
                self.total_doc_len, len_sum
            )));
        }

        Ok(())
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Rank passages against a raw query string
    ///
    /// The query goes through the same tokenizer as the corpus. Returns at
    /// most `k` candidates, ordered by score descending with ties broken by
    /// passage id ascending. Passages sharing no term with the query never
    /// appear. An empty query or a query with no known terms yields an
    /// empty list.
    pub fn search(&self, query: &str, k: usize) -> Vec<Candidate> {
        self.search_terms(&tokenize(query), k)
    }

    /// Rank passages against pre-tokenized query terms
    ///
    /// Repeated query terms contribute once per occurrence.
    pub fn search_terms(&self, query_terms: &[String], k: usize) -> Vec<Candidate> {
        if query_terms.is_empty() || k == 0 || self.passages.is_empty() {
            return Vec::new();
        }

        let scorer = Bm25Scorer::new(self.params, &self.ctx);

        // Dense accumulator indexed by doc_id
        let mut scores = vec![0.0f64; self.passages.len()];
        let mut seen = vec![false; self.passages.len()];
        let mut touched: Vec<u32> = Vec::new();

        for term in query_terms {
            let Some(list) = self.postings.get(term.as_str()) else {
                continue;
            };
            let idf = self.ctx.idf(list.len());
            for entry in &list.entries {
                let did = entry.doc_id as usize;
                scores[did] += scorer.term_score(idf, entry.tf, self.doc_lens[did]);
                if !seen[did] {
                    seen[did] = true;
                    touched.push(entry.doc_id);
                }
            }
        }

        if touched.is_empty() {
            return Vec::new();
        }

        let mut result: Vec<ScoredDocId> = touched
            .into_iter()
            .map(|doc_id| ScoredDocId {
                doc_id,
                score: scores[doc_id as usize],
            })
            .collect();

        let cmp = |a: &ScoredDocId, b: &ScoredDocId| -> Ordering {
            b.score.total_cmp(&a.score).then_with(|| {
                self.passages[a.doc_id as usize]
                    .id
                    .cmp(&self.passages[b.doc_id as usize].id)
            })
        };

        if result.len() > k {
            // Partition puts the top-k in [0..k], unordered
            result.select_nth_unstable_by(k - 1, cmp);
            result.truncate(k);
        }
        result.sort_unstable_by(cmp);

        debug!(
            target: "retrieval::search",
            terms = query_terms.len(),
            hits = result.len(),
            "Lexical search"
        );

        assign_ranks(
            result
                .into_iter()
                .map(|s| (self.passages[s.doc_id as usize].id.clone(), s.score)),
        )
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Look up a passage by id
    pub fn passage(&self, id: &PassageId) -> Option<&Passage> {
        self.id_to_doc
            .get(id)
            .and_then(|&doc_id| self.passages.get(doc_id as usize))
    }

    /// All passages in build order
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Total number of indexed passages
    pub fn total_docs(&self) -> usize {
        self.ctx.total_docs
    }

    /// Check if the index holds no passages
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Number of passages containing `term` (already tokenized)
    pub fn doc_freq(&self, term: &str) -> usize {
        self.postings.get(term).map(PostingList::len).unwrap_or(0)
    }

    /// Term frequency of `term` in passage `id`
    pub fn term_freq(&self, term: &str, id: &PassageId) -> u32 {
        let Some(&doc_id) = self.id_to_doc.get(id) else {
            return 0;
        };
        self.postings
            .get(term)
            .and_then(|list| {
                list.entries
                    .binary_search_by_key(&doc_id, |e| e.doc_id)
                    .ok()
                    .map(|i| list.entries[i].tf)
            })
            .unwrap_or(0)
    }

    /// Token count of passage `id`
    pub fn doc_len(&self, id: &PassageId) -> Option<u32> {
        self.id_to_doc
            .get(id)
            .map(|&doc_id| self.doc_lens[doc_id as usize])
    }

    /// Average passage length in tokens
    pub fn avg_doc_len(&self) -> f64 {
        self.ctx.avg_doc_len
    }

    /// IDF of `term` under this corpus
    pub fn idf(&self, term: &str) -> f64 {
        self.ctx.idf(self.doc_freq(term))
    }

    /// BM25 parameters this index scores with
    pub fn params(&self) -> Bm25Params {
        self.params
    }
}

// ============================================================================
// Tests
// ============================================================================
