use std::sync::Arc;
use std::time::Duration;

use crate::core::config::settings::{LlmSettings, Timeouts};
use crate::core::errors::ApiError;
use crate::llm::provider::LlmProvider;
use crate::llm::types::{ChatMessage, ChatRequest};

/// Thin wrapper over a provider that pins model ids and enforces timeouts.
///
/// Calls are never retried: a second sample from the model is as likely to be
/// wrong as the first.
#[derive(Clone)]
pub struct LlmService {
    provider: Arc<dyn LlmProvider>,
    chat_model: String,
    embedding_model: String,
    temperature: f64,
    chat_timeout: Duration,
    embed_timeout: Duration,
}

impl LlmService {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: &LlmSettings, timeouts: &Timeouts) -> Self {
        Self {
            provider,
            chat_model: settings.chat_model.clone(),
            embedding_model: settings.embedding_model.clone(),
            temperature: settings.temperature,
            chat_timeout: timeouts.llm,
            embed_timeout: timeouts.embed,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Single-turn completion; the answer is returned trimmed.
    pub async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ApiError> {
        self.complete_with_history(system_prompt, &[], user_prompt)
            .await
    }

    pub async fn complete_with_history(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_prompt: &str,
    ) -> Result<String, ApiError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(user_prompt));

        let request = ChatRequest::new(messages).with_temperature(self.temperature);
        let call = self.provider.chat(request, &self.chat_model);
        let content = tokio::time::timeout(self.chat_timeout, call)
            .await
            .map_err(|_| {
                ApiError::Timeout(format!(
                    "LLM call exceeded {:?}",
                    self.chat_timeout
                ))
            })??;

        Ok(content.trim().to_string())
    }

    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let call = self.provider.embed(inputs, &self.embedding_model);
        let vectors = tokio::time::timeout(self.embed_timeout, call)
            .await
            .map_err(|_| {
                ApiError::Timeout(format!(
                    "Embedding call exceeded {:?}",
                    self.embed_timeout
                ))
            })??;

        if vectors.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "Embedding count mismatch: {} != {}",
                vectors.len(),
                inputs.len()
            )));
        }

        Ok(vectors)
    }
}
