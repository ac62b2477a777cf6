//! Core types for hybrid retrieval
//!
//! This crate defines the foundational types used throughout the system:
//! - Passage / PassageId: the retrievable unit and its stable identifier
//! - Candidate: one entry of a single ranking method's list
//! - FusedHit / SearchHit: fused and final result entries
//! - MetadataFilter: exact-match attribute predicate
//! - RetrievalError: fatal error hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidate;
pub mod error;
pub mod filter;
pub mod passage;

pub use candidate::{assign_ranks, Candidate, FusedHit, SearchHit};
pub use error::{RetrievalError, RetrievalResult};
pub use filter::MetadataFilter;
pub use passage::{Passage, PassageId};
