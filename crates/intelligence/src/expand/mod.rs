//! Query expansion for lexical recall
//!
//! An expander rewrites the user's query into a longer query carrying
//! related technical terms, synonyms and acronyms. The expanded text feeds
//! the lexical index and the vector provider; reranking always sees the
//! original query.
//!
//! The shipped implementation, `TermListExpander`, asks a completion model
//! for one term per line and appends the terms to the query:
//!
//! ```text
//! "how do solar panels work"
//!     -> ["photovoltaic", "PV", "MPPT"]
//!     -> "how do solar panels work photovoltaic PV MPPT"
//! ```

pub mod api;
pub mod error;
pub mod parser;
pub mod prompt;

#[cfg(test)]
pub(crate) mod mock;

pub use api::ApiExpander;
pub use error::ExpandError;

use crate::llm_client::LlmClientError;
use serde::{Deserialize, Serialize};

/// Trait for query expansion implementations.
///
/// May return the input unchanged. The trait is object-safe for use as
/// `Arc<dyn QueryExpander>`.
pub trait QueryExpander: Send + Sync {
    /// Expand a query into a single expanded query string.
    fn expand(&self, query: &str) -> Result<String, ExpandError>;
}

/// A text completion backend: prompt in, raw model text out.
pub trait CompletionModel: Send + Sync {
    /// Complete `prompt`
    fn complete(&self, prompt: &str) -> Result<String, LlmClientError>;
}

/// Full record of one expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionDetails {
    /// Query as given
    pub original_query: String,
    /// Terms parsed from the model output, at most `max_expansions`
    pub expansion_terms: Vec<String>,
    /// Query with the terms appended, or the original when there are none
    pub expanded_query: String,
}

/// Expander that appends model-suggested terms to the query
#[derive(Debug, Clone)]
pub struct TermListExpander<C> {
    model: C,
    max_expansions: usize,
}

/// Default number of appended terms
pub const DEFAULT_MAX_EXPANSIONS: usize = 5;

impl<C: CompletionModel> TermListExpander<C> {
    /// Create an expander over `model`
    pub fn new(model: C) -> Self {
        TermListExpander {
            model,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }

    /// Override the maximum number of appended terms.
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    /// Maximum number of appended terms
    pub fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    /// Expand and report the terms that were used
    pub fn expand_with_details(&self, query: &str) -> Result<ExpansionDetails, ExpandError> {
        let prompt = prompt::build_prompt(query, self.max_expansions);
        let response = self.model.complete(&prompt)?;
        let expansion_terms = parser::parse_terms(&response, self.max_expansions);

        let expanded_query = if expansion_terms.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, expansion_terms.join(" "))
        };

        Ok(ExpansionDetails {
            original_query: query.to_string(),
            expansion_terms,
            expanded_query,
        })
    }
}

impl<C: CompletionModel> QueryExpander for TermListExpander<C> {
    fn expand(&self, query: &str) -> Result<String, ExpandError> {
        self.expand_with_details(query).map(|d| d.expanded_query)
    }
}
