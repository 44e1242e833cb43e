//! services/api/src/adapters/completion_llm.rs
//!
//! This module contains the adapter for the mind-map generating LLM.
//! It implements the `CompletionService` port from the `core` crate against any
//! OpenAI-compatible chat-completions endpoint (Groq by default).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use mind_mapper_core::ports::{CompletionService, PortError, PortResult};
use tracing::debug;

/// Sampling temperature for structured (JSON) generations.
const JSON_TEMPERATURE: f32 = 0.2;
/// Sampling temperature for free-text explanations.
const TEXT_TEMPERATURE: f32 = 0.4;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompletionAdapter {
    /// Creates a new `OpenAiCompletionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    async fn complete(
        &self,
        system_prompt: &str,
        temperature: f32,
        response_format: Option<ResponseFormat>,
    ) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages).temperature(temperature);
        if let Some(format) = response_format {
            args.response_format(format);
        }
        let request = args
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Provider errors map to PortError::Unexpected.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Completion response contained no text content.".to_string())
            })?;

        debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content)
    }
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for OpenAiCompletionAdapter {
    async fn complete_json(&self, system_prompt: &str) -> PortResult<String> {
        self.complete(system_prompt, JSON_TEMPERATURE, Some(ResponseFormat::JsonObject))
            .await
    }

    async fn complete_text(&self, prompt: &str) -> PortResult<String> {
        self.complete(prompt, TEXT_TEMPERATURE, None).await
    }
}
