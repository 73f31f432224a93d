//! Anthropic Claude provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{AiError, AiResult};

use super::provider::{AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, TokenUsage};

/// Anthropic API endpoint
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

const PROVIDER: &str = "anthropic";

/// `max_tokens` is mandatory on the messages API.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Normalize model name to the canonical API model name.
fn normalize_model(model: &str) -> &str {
    match model {
        "opus" => "claude-opus-4-5-20251101",
        "sonnet" => "claude-sonnet-4-5-20250929",
        "haiku" => "claude-3-5-haiku-20241022",
        _ => model,
    }
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl From<AnthropicUsage> for TokenUsage {
    fn from(usage: AnthropicUsage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.input_tokens.saturating_add(usage.output_tokens),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    model: String,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

/// Anthropic Claude provider.
pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> AiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| AiError::Http {
                provider: PROVIDER,
                source,
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: ANTHROPIC_API_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Convert messages to Anthropic format.
    ///
    /// Leading system messages are lifted into the separate `system` field.
    /// A system message after the conversation has started is sent as a user
    /// turn so it keeps its place. Consecutive turns from the same role are
    /// merged so the conversation alternates.
    fn convert_messages(messages: &[AIMessage]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system: Vec<&str> = Vec::new();
        let mut converted: Vec<AnthropicMessage> = Vec::new();

        for msg in messages {
            let role = match msg.role {
                AIRole::System if converted.is_empty() => {
                    system.push(&msg.content);
                    continue;
                }
                AIRole::System | AIRole::User => "user",
                AIRole::Assistant => "assistant",
            };

            match converted.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(&msg.content);
                }
                _ => converted.push(AnthropicMessage {
                    role,
                    content: msg.content.clone(),
                }),
            }
        }

        let system = (!system.is_empty()).then(|| system.join("\n\n"));
        (system, converted)
    }
}

#[async_trait]
impl AIProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn api_key_env_var(&self) -> &'static str {
        "ANTHROPIC_API_KEY"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn supports_model(&self, model: &str) -> bool {
        model.starts_with("claude-") || matches!(model, "opus" | "sonnet" | "haiku")
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> AiResult<AIResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(AiError::MissingApiKey(self.api_key_env_var()))?;

        let (system, converted_messages) = Self::convert_messages(messages);

        let request = AnthropicRequest {
            model: normalize_model(model).to_string(),
            messages: converted_messages,
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            temperature: options.temperature,
        };

        debug!(model = %request.model, "Calling Anthropic messages API");

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|source| AiError::Http {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| AiError::Http {
            provider: PROVIDER,
            source,
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<AnthropicErrorResponse>(&body).map_or(
                body,
                |parsed| format!("{} - {}", parsed.error.error_type, parsed.error.message),
            );
            return Err(AiError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message,
            });
        }

        let api_response: AnthropicResponse =
            serde_json::from_str(&body).map_err(|e| AiError::Parse {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;

        let text = api_response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect::<String>();

        Ok(AIResponse {
            text,
            usage: api_response.usage.into(),
            model: api_response.model,
            provider: PROVIDER.to_string(),
        })
    }
}
