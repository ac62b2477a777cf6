//! Completion models for deterministic testing

use super::CompletionModel;
use crate::llm_client::LlmClientError;
use parking_lot::Mutex;
use std::sync::Arc;

/// Returns the same text for every prompt and remembers the last prompt.
#[derive(Debug, Clone)]
pub struct CannedModel {
    response: String,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl CannedModel {
    pub fn new(response: &str) -> Self {
        CannedModel {
            response: response.to_string(),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().clone()
    }
}

impl CompletionModel for CannedModel {
    fn complete(&self, prompt: &str) -> Result<String, LlmClientError> {
        *self.last_prompt.lock() = Some(prompt.to_string());
        Ok(self.response.clone())
    }
}

/// Always fails with the given error.
#[derive(Debug, Clone)]
pub struct FailingModel(pub LlmClientError);

impl CompletionModel for FailingModel {
    fn complete(&self, _prompt: &str) -> Result<String, LlmClientError> {
        Err(self.0.clone())
    }
}
