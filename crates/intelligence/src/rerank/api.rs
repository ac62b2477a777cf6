//! Relevance scorer backed by a chat completions endpoint
//!
//! Passages go out in numbered batches of `batch_size`, one call per
//! batch. The model rates each 0-10; ratings are mapped back to passage
//! ids and normalized to [0.0, 1.0].

use super::{RerankError, RerankScorer};
use crate::config::ModelConfig;
use crate::llm_client::{ChatEndpoint, LlmClientError};
use retrieval_core::PassageId;

/// Zero for repeatable ratings
const RERANK_TEMPERATURE: f32 = 0.0;
/// Room for one short line per passage in a full batch
const RERANK_MAX_TOKENS: u32 = 200;
/// Passages per request
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Scorer reached over HTTP (Ollama, vLLM, llama.cpp server, OpenAI)
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "rerank"), allow(dead_code))]
pub struct ApiReranker {
    endpoint: ChatEndpoint,
    temperature: f32,
    max_tokens: u32,
    batch_size: usize,
}

impl ApiReranker {
    /// Scorer talking to `endpoint`
    pub fn new(endpoint: ChatEndpoint) -> Self {
        ApiReranker {
            endpoint,
            temperature: RERANK_TEMPERATURE,
            max_tokens: RERANK_MAX_TOKENS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Scorer for a `[model]` config section
    pub fn from_model_config(config: &ModelConfig) -> Self {
        Self::new(ChatEndpoint::from_model_config(config))
    }

    /// Builder: passages per request (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Builder: response token cap
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Endpoint this scorer calls
    pub fn endpoint(&self) -> &ChatEndpoint {
        &self.endpoint
    }

    /// Passages per request
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[cfg(feature = "rerank")]
    fn call_api(&self, query: &str, texts: &[&str]) -> Result<String, LlmClientError> {
        let request = self.endpoint.request(
            super::prompt::build_rerank_messages(query, texts),
            self.temperature,
            self.max_tokens,
        );
        crate::llm_client::call_chat_completions(&request)
    }

    #[cfg(not(feature = "rerank"))]
    fn call_api(&self, _query: &str, _texts: &[&str]) -> Result<String, LlmClientError> {
        Err(LlmClientError::FeatureDisabled("rerank"))
    }

    fn score_batch(
        &self,
        query: &str,
        batch: &[(PassageId, &str)],
    ) -> Result<Vec<(PassageId, f64)>, LlmClientError> {
        let texts: Vec<&str> = batch.iter().map(|(_, text)| *text).collect();
        crate::llm_client::retry_once(
            || self.call_api(query, &texts),
            |text| parse_rerank_response(text, batch),
            |result| result.is_empty(),
            || LlmClientError::Parse("model returned no usable scores".to_string()),
            "rerank",
        )
    }
}

/// Parse the model's response text into (id, relevance) pairs.
///
/// Accepts `Doc: 3, Relevance: 7` lines and the terser `3: 7`. Document
/// numbers are 1-based positions in `batch`. Scores are clamped to 0-10
/// and normalized to [0.0, 1.0]; lines that do not parse or name a
/// document outside the batch are skipped.
pub fn parse_rerank_response(text: &str, batch: &[(PassageId, &str)]) -> Vec<(PassageId, f64)> {
    text.lines()
        .filter_map(parse_score_line)
        .filter(|(doc, _)| (1..=batch.len()).contains(doc))
        .map(|(doc, raw)| (batch[doc - 1].0.clone(), raw.clamp(0.0, 10.0) / 10.0))
        .collect()
}

/// One `(document number, raw score)` pair from a response line
fn parse_score_line(line: &str) -> Option<(usize, f64)> {
    let line = line.trim();
    let (doc, score) = match line.split_once(',') {
        Some((doc, score)) => (
            strip_label(doc, "doc")?,
            strip_label(score, "relevance")?,
        ),
        None => line.split_once(':')?,
    };
    let doc = doc.trim().parse::<usize>().ok()?;
    let score = score.trim().parse::<f64>().ok()?;
    (!score.is_nan()).then_some((doc, score))
}

/// `"Doc: 3"` -> `"3"`, case-insensitive on the label
fn strip_label<'a>(part: &'a str, label: &str) -> Option<&'a str> {
    let (name, value) = part.trim().split_once(':')?;
    name.trim().eq_ignore_ascii_case(label).then_some(value)
}

impl RerankScorer for ApiReranker {
    fn score(
        &self,
        query: &str,
        passages: &[(PassageId, &str)],
    ) -> Result<Vec<(PassageId, f64)>, RerankError> {
        let mut scores = Vec::with_capacity(passages.len());
        let mut last_err = None;

        for batch in passages.chunks(self.batch_size) {
            match self.score_batch(query, batch) {
                Ok(batch_scores) => scores.extend(batch_scores),
                Err(e) => {
                    tracing::warn!(
                        target: "retrieval::llm_client",
                        op = "rerank",
                        batch_len = batch.len(),
                        error = %e,
                        "Rerank batch failed, leaving it unscored"
                    );
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if scores.is_empty() => Err(e.into()),
            _ => Ok(scores),
        }
    }

    fn name(&self) -> &str {
        "api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn batch<'a>(ids: &[&str], texts: &[&'a str]) -> Vec<(PassageId, &'a str)> {
        ids.iter().map(|id| PassageId::from(*id)).zip(texts.iter().copied()).collect()
    }

    fn endpoint() -> ChatEndpoint {
        ChatEndpoint::new("http://localhost:11434/v1/", "qwen3:1.7b", Duration::from_secs(5))
    }

    #[test]
    fn test_defaults() {
        let reranker = ApiReranker::new(endpoint());
        assert_eq!(
            reranker.endpoint().url,
            "http://localhost:11434/v1/chat/completions"
        );
        assert_eq!(reranker.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(reranker.temperature, 0.0);
    }

    #[test]
    fn test_batch_size_floor() {
        assert_eq!(ApiReranker::new(endpoint()).with_batch_size(0).batch_size(), 1);
    }

    #[test]
    fn test_parse_rerank_response_basic() {
        let b = batch(&["P1", "P2", "P3"], &["doc a", "doc b", "doc c"]);
        let scores = parse_rerank_response("1: 8\n2: 5\n3: 3\n", &b);
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].0.as_str(), "P1");
        assert!((scores[0].1 - 0.8).abs() < 1e-9);
        assert!((scores[1].1 - 0.5).abs() < 1e-9);
        assert_eq!(scores[2].0.as_str(), "P3");
    }

    #[test]
    fn test_parse_rerank_response_labelled_lines() {
        let b = batch(&["P1", "P2", "P3"], &["doc a", "doc b", "doc c"]);
        let scores = parse_rerank_response("Doc: 2, Relevance: 9\ndoc: 1, relevance: 4\n", &b);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].0.as_str(), "P2");
        assert!((scores[0].1 - 0.9).abs() < 1e-9);
        assert_eq!(scores[1].0.as_str(), "P1");
        assert!(parse_rerank_response("Doc: 1, Score: 4", &b).is_empty());
    }

    #[test]
    fn test_parse_rerank_response_with_decimals() {
        let b = batch(&["x", "y"], &["doc a", "doc b"]);
        let scores = parse_rerank_response("1: 7.5\n2: 3.2\n", &b);
        assert!((scores[0].1 - 0.75).abs() < 1e-9);
        assert!((scores[1].1 - 0.32).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rerank_response_clamps_scores() {
        let b = batch(&["x", "y"], &["doc a", "doc b"]);
        let scores = parse_rerank_response("1: 15\n2: -5\n", &b);
        assert_eq!(scores[0].1, 1.0);
        assert_eq!(scores[1].1, 0.0);
    }

    #[test]
    fn test_parse_rerank_response_ignores_invalid_lines() {
        let b = batch(&["x", "y"], &["doc a", "doc b"]);
        let scores = parse_rerank_response("1: 8\nsome garbage\n2: five\n0: 4\n", &b);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].0.as_str(), "x");
    }

    #[test]
    fn test_parse_rerank_response_out_of_range_number() {
        let b = batch(&["x"], &["doc a"]);
        assert!(parse_rerank_response("5: 8\n", &b).is_empty());
        assert!(parse_rerank_response("", &b).is_empty());
    }

    #[cfg(not(feature = "rerank"))]
    #[test]
    fn test_feature_disabled_surfaces_as_error() {
        let reranker = ApiReranker::new(ChatEndpoint::new(
            "http://localhost:1/v1",
            "m",
            Duration::from_millis(100),
        ));
        let b = batch(&["x"], &["doc a"]);
        assert_eq!(
            reranker.score("q", &b).unwrap_err(),
            RerankError::FeatureDisabled("rerank")
        );
    }
}
