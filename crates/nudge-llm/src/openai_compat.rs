//! OpenAI-compatible chat completions provider.
//!
//! Serves both OpenRouter (the default rule generation backend) and OpenAI
//! itself; the two differ only in base URL, key variable and a pair of
//! attribution headers.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use nudge_core::config::LlmProvider;
use nudge_core::error::{ErrorCode, NudgeError, NudgeResult};
use nudge_core::traits::{
    GenerationOptions, Llm, LlmConfig, LlmResponse, Message, MessageRole, ResponseFormat, TokenUsage,
};

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

const APP_TITLE: &str = "Nudge Rule Editor";
const APP_REFERER: &str = "https://localhost";

/// Chat completions client for OpenAI-compatible APIs.
pub struct OpenAiCompatLlm {
    client: Client,
    config: LlmConfig,
    api_key: SecretString,
    endpoint: Url,
    attribution: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatParam>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormatParam {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

impl OpenAiCompatLlm {
    /// Create a provider for OpenRouter or OpenAI.
    pub fn new(provider: LlmProvider, config: LlmConfig) -> NudgeResult<Self> {
        let (default_url, attribution) = match provider {
            LlmProvider::OpenRouter => (OPENROUTER_API_URL, true),
            LlmProvider::OpenAI => (OPENAI_API_URL, false),
            LlmProvider::Anthropic => {
                return Err(NudgeError::Configuration(
                    "Anthropic is not an OpenAI-compatible provider".to_string(),
                ))
            }
        };

        let key_env = provider.api_key_env();
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(key_env).ok())
            .ok_or_else(|| {
                NudgeError::Configuration(format!(
                    "{} API key not found. Set {} environment variable or provide api_key in config.",
                    provider, key_env
                ))
            })?;

        let base_url = config.base_url.clone().unwrap_or_else(|| default_url.to_string());
        let endpoint = Self::endpoint(&base_url)?;

        let client = Client::builder()
            .build()
            .map_err(|e| NudgeError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let mut config = config;
        if config.model.is_empty() {
            config.model = provider.default_model().to_string();
        }

        Ok(Self {
            client,
            config,
            api_key: SecretString::new(api_key),
            endpoint,
            attribution,
        })
    }

    fn endpoint(base_url: &str) -> NudgeResult<Url> {
        let mut base = Url::parse(base_url)
            .map_err(|e| NudgeError::Configuration(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("chat/completions")
            .map_err(|e| NudgeError::Configuration(format!("Invalid base URL '{}': {}", base_url, e)))
    }

    fn build_request<'a>(&'a self, messages: &'a [Message], options: &GenerationOptions) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: role_name(m.role),
                    content: &m.content,
                })
                .collect(),
            temperature: Some(options.temperature.unwrap_or(self.config.temperature)),
            max_tokens: Some(options.max_tokens.unwrap_or(self.config.max_tokens)),
            top_p: options.top_p,
            response_format: match options.response_format {
                Some(ResponseFormat::Json) => Some(ResponseFormatParam { kind: "json_object" }),
                _ => None,
            },
        }
    }
}

#[async_trait]
impl Llm for OpenAiCompatLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> NudgeResult<LlmResponse> {
        let options = options.unwrap_or_default();
        let request = self.build_request(messages, &options);
        debug!(model = %self.config.model, endpoint = %self.endpoint, "Sending chat completion");

        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&request);
        if self.attribution {
            builder = builder.header("HTTP-Referer", APP_REFERER).header("X-Title", APP_TITLE);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NudgeError::llm(format!("Chat completion request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NudgeError::llm(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.clone());
            return Err(NudgeError::llm(format!("Chat completion API error ({}): {}", status, message)));
        }

        parse_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn parse_response(body: &str) -> NudgeResult<LlmResponse> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| NudgeError::Llm {
        message: format!("Failed to parse response: {}", e),
        code: ErrorCode::LlmInvalidResponse,
        source: Some(Box::new(e)),
    })?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content);

    Ok(LlmResponse {
        content,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    })
}
