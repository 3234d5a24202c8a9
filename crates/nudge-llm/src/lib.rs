//! nudge-llm - LLM provider implementations for nudge.
//!
//! These providers back rule generation in `nudge-core`.
//!
//! # Supported Providers
//!
//! - **OpenRouter** - the default, any model OpenRouter routes to
//! - **OpenAI** - GPT-4o and friends through the same chat completions client
//! - **Anthropic** - Claude through the messages API
//!
//! # Example
//!
//! ```ignore
//! use nudge_llm::LlmFactory;
//!
//! // Reads OPENROUTER_API_KEY
//! let llm = LlmFactory::openrouter()?;
//!
//! // Or a specific Anthropic model
//! let llm = LlmFactory::anthropic_with_model("claude-3-5-sonnet-latest")?;
//! ```

mod anthropic;
mod factory;
mod openai_compat;

pub use anthropic::{AnthropicLlm, ANTHROPIC_API_URL};
pub use factory::LlmFactory;
pub use openai_compat::{OpenAiCompatLlm, OPENAI_API_URL, OPENROUTER_API_URL};

// Re-export core types for convenience
pub use nudge_core::config::LlmProvider;
pub use nudge_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat};
