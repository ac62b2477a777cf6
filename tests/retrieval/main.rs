//! Retrieval Integration Test Suite
//!
//! - **scenarios**: end-to-end behavior on the three-passage energy corpus
//! - **properties**: scoring, fusion, filtering and oversampling invariants (proptest)
//! - **snapshot_swap**: rebuilds under concurrent queries
//! - **config_file**: loading a retriever from `retrieval.toml`
//!
//! ```bash
//! cargo test --test retrieval
//! RUST_LOG=retrieval=debug cargo test --test retrieval scenarios -- --nocapture
//! ```

#[path = "../common/mod.rs"]
mod common;

mod config_file;
mod properties;
mod scenarios;
mod snapshot_swap;
