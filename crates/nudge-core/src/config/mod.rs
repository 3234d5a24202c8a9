//! Configuration system for nudge.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use strum::{Display, EnumString};

use crate::error::{NudgeError, NudgeResult};
use crate::rule::{RuleValidator, Strictness};
use crate::traits::LlmConfig;

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LlmProvider {
    /// OpenRouter's OpenAI-compatible gateway.
    #[default]
    OpenRouter,
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Environment variable holding the provider's API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenRouter => "openai/gpt-4o-mini",
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

/// Provider configuration with type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LlmProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl LlmProviderConfig {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            provider,
            config: LlmConfig {
                model: provider.default_model().to_string(),
                ..Default::default()
            },
        }
    }
}

/// Validation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ValidationConfig {
    pub strictness: Strictness,
}

impl ValidationConfig {
    pub fn validator(&self) -> RuleValidator {
        RuleValidator::new(self.strictness)
    }
}

/// Generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on one LLM round trip, in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Main nudge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    /// Path to the SQLite rule store.
    pub store_path: PathBuf,
    /// LLM configuration.
    pub llm: LlmProviderConfig,
    /// Validation configuration.
    pub validation: ValidationConfig,
    /// Generation configuration.
    pub generation: GenerationConfig,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        let nudge_dir = dirs::home_dir()
            .map(|h| h.join(".nudge"))
            .unwrap_or_else(|| PathBuf::from(".nudge"));

        Self {
            store_path: nudge_dir.join("rules.db"),
            llm: LlmProviderConfig::default(),
            validation: ValidationConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl NudgeConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> NudgeResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => toml::from_str(&content).map_err(|e| NudgeError::Configuration(e.to_string())),
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| NudgeError::Configuration(e.to_string()))
            }
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| NudgeError::Configuration(e.to_string()))
            }
            _ => Err(NudgeError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> NudgeResult<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from an environment lookup.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> NudgeResult<()> {
        if let Some(path) = get("NUDGE_STORE_PATH") {
            self.store_path = PathBuf::from(path);
        }

        if let Some(provider) = get("NUDGE_LLM_PROVIDER") {
            let provider: LlmProvider = provider.trim().parse().map_err(|_| {
                NudgeError::Configuration(format!(
                    "Unknown LLM provider '{}'. Use openrouter, openai or anthropic",
                    provider
                ))
            })?;
            if provider != self.llm.provider {
                self.llm.provider = provider;
                self.llm.config.model = provider.default_model().to_string();
            }
        }
        if let Some(model) = get("NUDGE_LLM_MODEL") {
            self.llm.config.model = model;
        }
        if let Some(base_url) = get("NUDGE_LLM_BASE_URL") {
            self.llm.config.base_url = Some(base_url);
        }
        if let Some(api_key) = get(self.llm.provider.api_key_env()) {
            self.llm.config.api_key = Some(api_key);
        }

        if let Some(strictness) = get("NUDGE_STRICTNESS") {
            self.validation.strictness = strictness.trim().to_lowercase().parse().map_err(|_| {
                NudgeError::Configuration(format!(
                    "Unknown strictness '{}'. Use strict or advisory",
                    strictness
                ))
            })?;
        }
        if let Some(secs) = get("NUDGE_GENERATION_TIMEOUT_SECS") {
            self.generation.timeout_secs = secs.trim().parse().map_err(|_| {
                NudgeError::Configuration(format!("Invalid generation timeout '{}'", secs))
            })?;
        }

        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> NudgeConfigBuilder {
        NudgeConfigBuilder::default()
    }
}

/// Builder for NudgeConfig.
#[derive(Default)]
pub struct NudgeConfigBuilder {
    config: NudgeConfig,
}

impl NudgeConfigBuilder {
    /// Set the rule store path.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = path.into();
        self
    }

    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.config.validation.strictness = strictness;
        self
    }

    pub fn generation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.generation.timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> NudgeConfig {
        self.config
    }
}
