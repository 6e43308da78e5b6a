//! LLM interaction: send an assembled prompt and return the raw reply text.
//!
//! This module is intentionally thin. All prompt engineering lives in
//! [`crate::prompts`] and everything done with the reply lives in
//! [`crate::pipeline::extract`] and [`crate::pipeline::validate`].
//!
//! The model is an opaque collaborator behind [`ModelClient`]: instruction
//! and user message in, text out. [`ProviderClient`] adapts any
//! `edgequake_llm::LLMProvider` to it. There is no retry. A timeout, an auth
//! failure, or any other provider error goes straight back to the caller.

use crate::error::DeckError;
use crate::pipeline::prompt::PromptPayload;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

/// Sampling settings for one model call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionSettings {
    pub temperature: f32,
    pub max_tokens: usize,
    /// Wall-clock budget for the whole call.
    pub timeout_secs: u64,
}

impl CompletionSettings {
    /// Analysis: moderately creative, short JSON object.
    pub fn analysis() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 2000,
            timeout_secs: 120,
        }
    }

    /// Generation: more creative, long JSON array with embedded blocks.
    pub fn generation() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 8192,
            timeout_secs: 120,
        }
    }
}

/// The LLM collaborator: prompt in, raw text out.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &PromptPayload,
        settings: &CompletionSettings,
    ) -> Result<String, DeckError>;
}

/// [`ModelClient`] backed by an `edgequake_llm` provider.
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderClient {
    /// `label` names the provider in error messages (e.g. `"openai"`).
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &"<dyn LLMProvider>")
            .field("label", &self.label)
            .finish()
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    /// ## Message Layout
    ///
    /// 1. **System message** — the assembled instruction (persona + output
    ///    contract)
    /// 2. **User message** — lead-in, optional analysis context, product text
    async fn complete(
        &self,
        prompt: &PromptPayload,
        settings: &CompletionSettings,
    ) -> Result<String, DeckError> {
        let messages = vec![
            ChatMessage::system(prompt.instruction.as_str()),
            ChatMessage::user(prompt.user_message.as_str()),
        ];
        let options = build_options(settings);

        let start = Instant::now();
        info!(
            "Calling provider '{}' (max_tokens={}, temperature={})",
            self.label, settings.max_tokens, settings.temperature
        );

        let response = timeout(
            Duration::from_secs(settings.timeout_secs),
            self.provider.chat(&messages, Some(&options)),
        )
        .await
        .map_err(|_| DeckError::UpstreamTimeout {
            secs: settings.timeout_secs,
        })?
        .map_err(|e| DeckError::from_provider_message(&self.label, format!("{}", e)))?;

        debug!(
            "Provider '{}': {} input tokens, {} output tokens, {:?}",
            self.label,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the stage settings.
fn build_options(settings: &CompletionSettings) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(settings.temperature),
        max_tokens: Some(settings.max_tokens),
        ..Default::default()
    }
}
