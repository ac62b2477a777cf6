//! Retrieval configuration via `retrieval.toml`
//!
//! Every section is optional; missing keys fall back to defaults. The
//! configuration is fixed for the lifetime of a `Retriever`: it is copied
//! at construction, and BM25 parameters are additionally captured inside
//! each index snapshot.

use retrieval_core::{RetrievalError, RetrievalResult};
use retrieval_search::{Bm25Params, OversamplePolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "retrieval.toml";

/// Default cap on live workers per external stage
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// `[bm25]` section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Bm25Config {
    /// Term frequency saturation
    pub k1: f64,
    /// Length normalization
    pub b: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        let p = Bm25Params::default();
        Bm25Config { k1: p.k1, b: p.b }
    }
}

/// `[fusion]` section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FusionConfig {
    /// RRF smoothing constant
    pub rrf_k: u32,
    /// Multiplier on each lexical contribution
    pub lexical_weight: f64,
    /// Multiplier on each vector contribution
    pub vector_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            rrf_k: 60,
            lexical_weight: 1.0,
            vector_weight: 1.0,
        }
    }
}

/// `[filter]` section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterConfig {
    /// Fetch-size multiplier when a metadata filter is present
    pub oversample_multiplier: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            oversample_multiplier: 3,
        }
    }
}

/// `[retrieval]` section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalSection {
    /// Result count used when the caller does not pick one
    pub default_count: usize,
    /// Fetch-size multiplier on the lexical-only path
    pub lexical_headroom_multiplier: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        RetrievalSection {
            default_count: 5,
            lexical_headroom_multiplier: 2,
        }
    }
}

/// `[expansion]` section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Expand queries when an expander is installed
    pub enabled: bool,
    /// Maximum expansion terms appended to a query
    pub max_expansions: usize,
    /// Queries with fewer whitespace-separated words are not expanded
    pub min_query_words: usize,
    /// Deadline for one expansion call
    pub timeout_ms: u64,
    /// Expansion workers allowed alive at once, timed-out ones included
    pub max_in_flight: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        ExpansionConfig {
            enabled: true,
            max_expansions: 5,
            min_query_words: 3,
            timeout_ms: 5000,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// `[vector]` section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VectorConfig {
    /// Deadline for one vector search call
    pub timeout_ms: u64,
    /// Vector workers allowed alive at once, timed-out ones included
    pub max_in_flight: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        VectorConfig {
            timeout_ms: 2000,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// `[rerank]` section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RerankConfig {
    /// Deadline for one rerank call
    pub timeout_ms: u64,
    /// Candidates sent to the scorer; the rest keep their position
    pub max_candidates: usize,
    /// Rerank workers allowed alive at once, timed-out ones included
    pub max_in_flight: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        RerankConfig {
            timeout_ms: 5000,
            max_candidates: 15,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Configuration for an external inference model endpoint.
///
/// When present, `Retriever::with_configured_model` uses it to construct
/// a query expander and a reranker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// OpenAI-compatible API endpoint (e.g. "http://localhost:11434/v1")
    pub endpoint: String,
    /// Model name (e.g. "qwen3:1.7b")
    pub model: String,
    /// Optional API key for authenticated endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in milliseconds (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5000
}

/// Retrieval configuration loaded from `retrieval.toml`.
///
/// # Example
///
/// ```toml
/// [bm25]
/// k1 = 1.5
/// b = 0.75
///
/// [filter]
/// oversample_multiplier = 3
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// BM25 parameters
    #[serde(default)]
    pub bm25: Bm25Config,
    /// Rank fusion
    #[serde(default)]
    pub fusion: FusionConfig,
    /// Attribute filter oversampling
    #[serde(default)]
    pub filter: FilterConfig,
    /// Result counts and lexical headroom
    #[serde(default)]
    pub retrieval: RetrievalSection,
    /// Query expansion
    #[serde(default)]
    pub expansion: ExpansionConfig,
    /// Vector search
    #[serde(default)]
    pub vector: VectorConfig,
    /// Reranking
    #[serde(default)]
    pub rerank: RerankConfig,
    /// Optional model endpoint for API-backed expansion and reranking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,
}

impl RetrievalConfig {
    /// Check every value; called by all loaders and by `Retriever::new`
    pub fn validate(&self) -> RetrievalResult<()> {
        self.bm25_params().validate()?;
        OversamplePolicy::new(
            self.filter.oversample_multiplier,
            self.retrieval.lexical_headroom_multiplier,
        )?;
        for (key, weight) in [
            ("fusion.lexical_weight", self.fusion.lexical_weight),
            ("fusion.vector_weight", self.fusion.vector_weight),
        ] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(RetrievalError::invalid_input(format!(
                    "{} must be a positive number, got {}",
                    key, weight
                )));
            }
        }
        if self.rerank.max_candidates == 0 {
            return Err(RetrievalError::invalid_input(
                "rerank.max_candidates must be >= 1",
            ));
        }
        for (section, limit) in [
            ("expansion", self.expansion.max_in_flight),
            ("vector", self.vector.max_in_flight),
            ("rerank", self.rerank.max_in_flight),
        ] {
            if limit == 0 {
                return Err(RetrievalError::invalid_input(format!(
                    "{}.max_in_flight must be >= 1",
                    section
                )));
            }
        }
        if let Some(model) = &self.model {
            if model.endpoint.trim().is_empty() {
                return Err(RetrievalError::invalid_input("model.endpoint is empty"));
            }
            if model.model.trim().is_empty() {
                return Err(RetrievalError::invalid_input("model.model is empty"));
            }
        }
        Ok(())
    }

    /// BM25 parameters for index builds
    pub fn bm25_params(&self) -> Bm25Params {
        Bm25Params::new(self.bm25.k1, self.bm25.b)
    }

    /// Oversampling policy
    pub fn oversample_policy(&self) -> RetrievalResult<OversamplePolicy> {
        OversamplePolicy::new(
            self.filter.oversample_multiplier,
            self.retrieval.lexical_headroom_multiplier,
        )
    }

    /// Deadline for the expansion call
    pub fn expansion_timeout(&self) -> Duration {
        Duration::from_millis(self.expansion.timeout_ms)
    }

    /// Deadline for the vector search call
    pub fn vector_timeout(&self) -> Duration {
        Duration::from_millis(self.vector.timeout_ms)
    }

    /// Deadline for the rerank call
    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_millis(self.rerank.timeout_ms)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Retrieval configuration

[bm25]
# Term frequency saturation and length normalization
k1 = 1.5
b = 0.75

[fusion]
# Reciprocal Rank Fusion smoothing constant
rrf_k = 60
# Per-list multipliers on 1 / (rrf_k + rank)
lexical_weight = 1.0
vector_weight = 1.0

[filter]
# Candidates fetched per requested result when a metadata filter is present
oversample_multiplier = 3

[retrieval]
default_count = 5
# Candidates fetched per requested result when vector search is off
lexical_headroom_multiplier = 2

[expansion]
enabled = true
max_expansions = 5
# Shorter queries are searched as-is
min_query_words = 3
timeout_ms = 5000
# Workers still running after a timeout count against this
max_in_flight = 8

[vector]
timeout_ms = 2000
max_in_flight = 8

[rerank]
timeout_ms = 5000
max_candidates = 15
max_in_flight = 8

# Model configuration for query expansion and re-ranking.
# Uncomment and configure to enable API-backed expansion and reranking.
# [model]
# endpoint = "http://localhost:11434/v1"
# model = "qwen3:1.7b"
# api_key = "your-api-key"      # optional
# timeout_ms = 5000              # optional, default 5000
"#
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml_str(content: &str) -> RetrievalResult<Self> {
        let config: RetrievalConfig = toml::from_str(content)
            .map_err(|e| RetrievalError::invalid_input(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> RetrievalResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::internal(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: RetrievalConfig = toml::from_str(&content).map_err(|e| {
            RetrievalError::invalid_input(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> RetrievalResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                RetrievalError::internal(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> RetrievalResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RetrievalError::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            RetrievalError::internal(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
