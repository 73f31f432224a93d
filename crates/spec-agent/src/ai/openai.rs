//! OpenAI chat completions provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{AiError, AiResult};

use super::provider::{AIMessage, AIProvider, AIResponse, GenerateOptions, TokenUsage};

/// OpenAI API endpoint
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

const PROVIDER: &str = "openai";

/// Model families served by the chat completions endpoint.
const MODEL_PREFIXES: &[&str] = &["gpt-", "o1", "o3", "o4", "chatgpt-"];

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    model: String,
    #[serde(default)]
    usage: OpenAIUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

/// OpenAI GPT provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with an optional API key.
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
            base_url: OPENAI_API_URL.to_string(),
        })
    }

    /// Set a custom base URL (useful for Azure OpenAI or proxies).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn convert_messages(messages: &[AIMessage]) -> Vec<OpenAIMessage<'_>> {
        messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: msg.role.as_str(),
                content: &msg.content,
            })
            .collect()
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn api_key_env_var(&self) -> &'static str {
        "OPENAI_API_KEY"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn supports_model(&self, model: &str) -> bool {
        MODEL_PREFIXES.iter().any(|prefix| model.starts_with(prefix))
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

        let request = OpenAIRequest {
            model,
            messages: Self::convert_messages(messages),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        debug!(model, messages = messages.len(), "Calling OpenAI chat completions");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
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
            let message = serde_json::from_str::<OpenAIErrorResponse>(&body)
                .map_or(body, |parsed| parsed.error.message);
            return Err(AiError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message,
            });
        }

        let api_response: OpenAIResponse =
            serde_json::from_str(&body).map_err(|e| AiError::Parse {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::Parse {
                provider: PROVIDER,
                reason: "response contained no message content".to_string(),
            })?;

        Ok(AIResponse {
            text,
            usage: TokenUsage {
                input_tokens: api_response.usage.prompt_tokens,
                output_tokens: api_response.usage.completion_tokens,
                total_tokens: api_response.usage.total_tokens,
            },
            model: api_response.model,
            provider: PROVIDER.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new(None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_supported_models() {
        let provider = provider();
        assert!(provider.supports_model("gpt-4o"));
        assert!(provider.supports_model("gpt-3.5-turbo"));
        assert!(provider.supports_model("o1-mini"));
        assert!(!provider.supports_model("claude-3-opus-20240229"));
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            AIMessage::system("You are a helpful assistant"),
            AIMessage::user("Hello"),
            AIMessage::assistant("Hi there!"),
        ];

        let converted = OpenAIProvider::convert_messages(&messages);

        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[2].role, "assistant");
        assert_eq!(converted[2].content, "Hi there!");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let err = provider()
            .generate_text("gpt-4o", &[AIMessage::user("hi")], &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey("OPENAI_API_KEY")));
    }
}
