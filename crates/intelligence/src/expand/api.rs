//! Completion model backed by a chat completions endpoint
//!
//! Sends the expansion prompt as a single user message and hands the raw
//! reply to `TermListExpander` for parsing.

use super::{CompletionModel, TermListExpander};
use crate::config::ModelConfig;
use crate::llm_client::{ChatEndpoint, LlmClientError};

/// Low so the generated terms stay on topic
const EXPAND_TEMPERATURE: f32 = 0.3;
/// A handful of short lines never needs more
const EXPAND_MAX_TOKENS: u32 = 200;

/// Expansion model reached over HTTP (Ollama, vLLM, llama.cpp server, OpenAI)
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "expand"), allow(dead_code))]
pub struct ApiExpander {
    endpoint: ChatEndpoint,
    temperature: f32,
    max_tokens: u32,
}

impl ApiExpander {
    /// Expander talking to `endpoint`
    pub fn new(endpoint: ChatEndpoint) -> Self {
        ApiExpander {
            endpoint,
            temperature: EXPAND_TEMPERATURE,
            max_tokens: EXPAND_MAX_TOKENS,
        }
    }

    /// Expander for a `[model]` config section
    pub fn from_model_config(config: &ModelConfig) -> Self {
        Self::new(ChatEndpoint::from_model_config(config))
    }

    /// Wrap in a `TermListExpander` appending at most `max_expansions` terms
    pub fn into_expander(self, max_expansions: usize) -> TermListExpander<Self> {
        TermListExpander::new(self).with_max_expansions(max_expansions)
    }

    /// Builder: sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Builder: response token cap
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Endpoint this expander calls
    pub fn endpoint(&self) -> &ChatEndpoint {
        &self.endpoint
    }

    #[cfg(feature = "expand")]
    fn call_api(&self, prompt: &str) -> Result<String, LlmClientError> {
        let request = self.endpoint.request(
            super::prompt::build_messages(prompt),
            self.temperature,
            self.max_tokens,
        );
        crate::llm_client::call_chat_completions(&request)
    }

    #[cfg(not(feature = "expand"))]
    fn call_api(&self, _prompt: &str) -> Result<String, LlmClientError> {
        Err(LlmClientError::FeatureDisabled("expand"))
    }
}

impl CompletionModel for ApiExpander {
    fn complete(&self, prompt: &str) -> Result<String, LlmClientError> {
        crate::llm_client::retry_once(
            || self.call_api(prompt),
            |text| text.trim().to_string(),
            |text| text.is_empty(),
            || LlmClientError::Parse("model returned an empty expansion".to_string()),
            "expand",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let expander = ApiExpander::new(ChatEndpoint::new(
            "http://localhost:11434/v1/",
            "qwen3:1.7b",
            Duration::from_secs(5),
        ));
        assert_eq!(
            expander.endpoint().url,
            "http://localhost:11434/v1/chat/completions"
        );
        assert_eq!(expander.temperature, EXPAND_TEMPERATURE);
        assert_eq!(expander.max_tokens, EXPAND_MAX_TOKENS);
    }

    #[test]
    fn test_builders_override_sampling() {
        let endpoint = ChatEndpoint::new("http://x/v1", "m", Duration::from_secs(1));
        let expander = ApiExpander::new(endpoint)
            .with_temperature(0.7)
            .with_max_tokens(64);
        assert_eq!(expander.temperature, 0.7);
        assert_eq!(expander.max_tokens, 64);
    }

    #[test]
    fn test_from_model_config_carries_key() {
        let config = ModelConfig {
            endpoint: "http://localhost:8080/v1".to_string(),
            model: "llama3".to_string(),
            api_key: Some("sk-test".to_string()),
            timeout_ms: 1500,
        };
        let expander = ApiExpander::from_model_config(&config);
        assert_eq!(expander.endpoint().api_key.as_deref(), Some("sk-test"));
        assert_eq!(expander.endpoint().model, "llama3");
    }

    #[cfg(not(feature = "expand"))]
    #[test]
    fn test_feature_disabled_surfaces_as_error() {
        use crate::expand::{ExpandError, QueryExpander};

        let endpoint = ChatEndpoint::new("http://localhost:1/v1", "m", Duration::from_millis(100));
        let expander = ApiExpander::new(endpoint).into_expander(5);
        assert_eq!(
            expander.expand("solar inverter sizing").unwrap_err(),
            ExpandError::FeatureDisabled("expand")
        );
    }
}
