//! Lexical search and rank fusion
//!
//! This crate provides:
//! - Whitespace tokenizer
//! - BM25 scorer with build-time corpus statistics
//! - LexicalIndex: immutable inverted index over a passage corpus
//! - IndexHandle: atomically swappable index snapshots
//! - Fuser trait and RRFFuser for rank fusion
//! - Attribute filter and oversampling policy
//!
//! # Usage
//!
//! ```
//! use retrieval_core::Passage;
//! use retrieval_search::{Bm25Params, Fuser, IndexHandle, RRFFuser};
//!
//! let handle = IndexHandle::with_corpus(
//!     vec![Passage::new("p1", "solar panel"), Passage::new("p2", "wind turbine")],
//!     Bm25Params::default(),
//! )
//! .unwrap();
//!
//! let snapshot = handle.load().unwrap();
//! let lexical = snapshot.search("solar", 10);
//! let fused = RRFFuser::default().fuse(&[&lexical]);
//! assert_eq!(fused[0].id.as_str(), "p1");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod filter;
pub mod fuser;
pub mod index;
pub mod scorer;
pub mod snapshot;
pub mod tokenizer;

// Re-export commonly used types
pub use filter::{filter_ranked, filter_with_index, FetchPlan, OversamplePolicy};
pub use fuser::{fused_order, pass_through, Fuser, RRFFuser};
pub use index::{LexicalIndex, PostingEntry, PostingList};
pub use scorer::{Bm25Params, Bm25Scorer, ScorerContext};
pub use snapshot::{IndexHandle, IndexSnapshot};
pub use tokenizer::{tokenize, tokenize_unique};
