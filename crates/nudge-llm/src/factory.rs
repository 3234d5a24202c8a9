//! Factory for creating LLM providers.

use std::sync::Arc;

use nudge_core::config::{LlmProvider, LlmProviderConfig};
use nudge_core::error::NudgeResult;
use nudge_core::traits::{Llm, LlmConfig};

use crate::anthropic::AnthropicLlm;
use crate::openai_compat::OpenAiCompatLlm;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> NudgeResult<Arc<dyn Llm>> {
        match provider {
            LlmProvider::OpenRouter | LlmProvider::OpenAI => {
                let llm = OpenAiCompatLlm::new(provider, config)?;
                Ok(Arc::new(llm))
            }
            LlmProvider::Anthropic => {
                let llm = AnthropicLlm::new(config)?;
                Ok(Arc::new(llm))
            }
        }
    }

    /// Create the provider described by a provider config section.
    pub fn from_config(config: &LlmProviderConfig) -> NudgeResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Create an OpenRouter provider with default configuration.
    pub fn openrouter() -> NudgeResult<Arc<dyn Llm>> {
        Self::from_config(&LlmProviderConfig::new(LlmProvider::OpenRouter))
    }

    /// Create an OpenRouter provider with a specific model.
    pub fn openrouter_with_model(model: impl Into<String>) -> NudgeResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::OpenRouter, config)
    }

    /// Create an Anthropic provider with a specific model.
    pub fn anthropic_with_model(model: impl Into<String>) -> NudgeResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Anthropic, config)
    }
}
