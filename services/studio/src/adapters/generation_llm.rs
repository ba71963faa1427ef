//! services/studio/src/adapters/generation_llm.rs
//!
//! This module contains the adapter for the story-writing LLM.
//! It implements the `GenerationService` port from the `core` crate against any
//! OpenAI-compatible chat completions endpoint.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client, error::OpenAIError,
};
use async_trait::async_trait;
use novel_assistant_core::{
    domain::{Extraction, GenerationContext, OutlineTarget},
    extraction::parse_extraction,
    ports::{GenerationService, PortError, PortResult},
    prompt,
};
use tracing::{debug, error};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerationAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds a client for `api_base`, e.g. the Gemini OpenAI-compatible endpoint.
    pub fn from_endpoint(api_base: &str, api_key: &str, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base.trim_end_matches('/'))
            .with_api_key(api_key);
        Self::new(Client::with_config(config), model)
    }

    /// Sends `prompt` as a single user message and returns the first choice's text.
    async fn ask(&self, prompt: String) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| {
                error!(model = %self.model, "Generation request failed: {}", e);
                PortError::Upstream(e.to_string())
            })?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            PortError::Upstream("Generation LLM returned no choices in its response.".to_string())
        })?;
        let content = choice.message.content.ok_or_else(|| {
            PortError::Upstream("Generation LLM response contained no text content.".to_string())
        })?;

        debug!(model = %self.model, length = content.chars().count(), "Generation response received");
        Ok(content.trim().to_string())
    }
}

//=========================================================================================
// `GenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for OpenAiGenerationAdapter {
    async fn generate(&self, instruction: &str, context: &GenerationContext) -> PortResult<String> {
        self.ask(prompt::build_generation_prompt(instruction, context))
            .await
    }

    async fn summarize(&self, text: &str) -> PortResult<String> {
        self.ask(prompt::summary_prompt(text)).await
    }

    async fn outline(&self, target: &OutlineTarget) -> PortResult<String> {
        self.ask(prompt::outline_prompt(target)).await
    }

    async fn complete(&self, prompt: &str) -> PortResult<String> {
        self.ask(prompt.to_string()).await
    }

    /// A malformed answer is not an error: the parser keeps what it can use.
    async fn extract_characters(&self, text: &str) -> PortResult<Extraction> {
        let answer = self.ask(prompt::extraction_prompt(text)).await?;
        Ok(parse_extraction(&answer))
    }
}
