//! Chat completions backed language model.

use super::{create_client, LanguageModel, ModelConnector, SupportedModel};
use crate::config::LlmSettings;
use crate::error::{GistError, Result};
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A model reached through an OpenAI-compatible chat completions endpoint.
pub struct ChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: SupportedModel,
}

impl ChatModel {
    pub fn new(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: SupportedModel,
    ) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LanguageModel for ChatModel {
    fn name(&self) -> &str {
        self.model.as_str()
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| GistError::Llm(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(vec![message.into()])
            .build()
            .map_err(|e| GistError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| GistError::Llm(format!("Failed to generate response: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| GistError::Llm("Empty response from model".to_string()))?;

        debug!(reply_len = content.len(), "Model replied");
        Ok(content)
    }
}

/// Connects [`ChatModel`]s using the configured API base.
#[derive(Debug, Clone)]
pub struct OpenAiConnector {
    settings: LlmSettings,
}

impl OpenAiConnector {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }
}

impl ModelConnector for OpenAiConnector {
    fn connect(&self, model: SupportedModel, api_key: &str) -> Result<Arc<dyn LanguageModel>> {
        let client = create_client(&self.settings, api_key)?;
        Ok(Arc::new(ChatModel::new(client, model)))
    }
}
