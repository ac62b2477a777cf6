//! Chat completions plumbing shared by the API expander and reranker
//!
//! One request shape, one HTTP path, one retry policy. Callers build a
//! [`ChatRequest`] and hand it to [`call_chat_completions`]; the
//! [`retry_once`] wrapper gives every model call a second chance.

use crate::config::ModelConfig;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to a model endpoint
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmClientError {
    /// Connection refused, DNS failure, non-2xx status
    #[error("network error: {0}")]
    Network(String),
    /// Response body was not a usable completion
    #[error("parse error: {0}")]
    Parse(String),
    /// The endpoint did not answer within the request timeout
    #[error("model request timed out")]
    Timeout,
    /// Built without the cargo feature that enables HTTP calls
    #[error("feature '{0}' not enabled")]
    FeatureDisabled(&'static str),
}

/// A single chat completions request
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    /// Full endpoint URL, including `/chat/completions`
    pub url: &'a str,
    /// Bearer token, if the endpoint wants one
    pub api_key: Option<&'a str>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Model name
    pub model: &'a str,
    /// `messages` array
    pub messages: serde_json::Value,
    /// Sampling temperature
    pub temperature: f32,
    /// Response token cap
    pub max_tokens: u32,
}

impl ChatRequest<'_> {
    /// JSON body sent to the endpoint
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": self.messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

/// Join a base endpoint and the chat completions path
pub fn completions_url(endpoint: &str) -> String {
    format!("{}/chat/completions", endpoint.trim_end_matches('/'))
}

/// Where a model lives and how long to wait for it
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEndpoint {
    /// Full chat completions URL
    pub url: String,
    /// Model name
    pub model: String,
    /// Bearer token
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ChatEndpoint {
    /// `endpoint` is the base URL, e.g. "http://localhost:11434/v1"
    pub fn new(endpoint: &str, model: impl Into<String>, timeout: Duration) -> Self {
        ChatEndpoint {
            url: completions_url(endpoint),
            model: model.into(),
            api_key: None,
            timeout,
        }
    }

    /// Builder: send a bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// From a `[model]` config section
    pub fn from_model_config(config: &ModelConfig) -> Self {
        ChatEndpoint {
            url: completions_url(&config.endpoint),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Request against this endpoint
    pub fn request(
        &self,
        messages: serde_json::Value,
        temperature: f32,
        max_tokens: u32,
    ) -> ChatRequest<'_> {
        ChatRequest {
            url: &self.url,
            api_key: self.api_key.as_deref(),
            timeout: self.timeout,
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        }
    }
}

/// POST `request` and return `choices[0].message.content`
#[cfg(any(feature = "expand", feature = "rerank"))]
pub fn call_chat_completions(request: &ChatRequest<'_>) -> Result<String, LlmClientError> {
    let payload = serde_json::to_vec(&request.body())
        .map_err(|e| LlmClientError::Parse(format!("failed to serialize request: {}", e)))?;

    let agent = ureq::Agent::new_with_config(
        ureq::Agent::config_builder()
            .timeout_global(Some(request.timeout))
            .build(),
    );

    let mut call = agent
        .post(request.url)
        .header("Content-Type", "application/json");
    if let Some(key) = request.api_key {
        call = call.header("Authorization", &format!("Bearer {}", key));
    }

    let mut response = call.send(&payload[..]).map_err(|e| match e {
        ureq::Error::Timeout(_) => LlmClientError::Timeout,
        other => LlmClientError::Network(other.to_string()),
    })?;

    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| LlmClientError::Network(format!("failed to read response: {}", e)))?;

    extract_content(&text)
}

/// Pull `choices[0].message.content` out of a chat completions response body
pub fn extract_content(response_text: &str) -> Result<String, LlmClientError> {
    let json: serde_json::Value = serde_json::from_str(response_text)
        .map_err(|e| LlmClientError::Parse(format!("invalid JSON response: {}", e)))?;

    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            let preview: String = response_text.chars().take(200).collect();
            LlmClientError::Parse(format!("unexpected response format: {}", preview))
        })
}

/// Attempts made by [`retry_once`]
const MAX_ATTEMPTS: u32 = 2;

/// Run a model call, retrying once if it fails or parses to nothing
///
/// `parse` turns the raw completion into a result and `is_empty` decides
/// whether that result is worth keeping. When the last attempt parses to
/// nothing, `on_empty` supplies the error; when it fails outright, its own
/// error is returned. `op` labels the log lines.
pub fn retry_once<T>(
    call: impl Fn() -> Result<String, LlmClientError>,
    parse: impl Fn(&str) -> T,
    is_empty: impl Fn(&T) -> bool,
    on_empty: impl Fn() -> LlmClientError,
    op: &str,
) -> Result<T, LlmClientError> {
    let mut last = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match call() {
            Ok(text) => {
                let parsed = parse(&text);
                if !is_empty(&parsed) {
                    return Ok(parsed);
                }
                tracing::warn!(
                    target: "retrieval::llm_client",
                    op,
                    attempt,
                    "Model returned no usable output"
                );
                last = Some(on_empty());
            }
            Err(e) => {
                tracing::warn!(
                    target: "retrieval::llm_client",
                    op,
                    attempt,
                    error = %e,
                    "Model call failed"
                );
                last = Some(e);
            }
        }
    }
    Err(last.unwrap_or_else(on_empty))
}
