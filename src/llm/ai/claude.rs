//! Anthropic Messages API client.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AiClient, AiClientMetadata};
use crate::llm::error::LlmError;
use crate::llm::prompts::Prompt;

/// Default Anthropic API base URL.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Model used when none is configured.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

/// Anthropic API client.
pub struct ClaudeAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl ClaudeAiClient {
    /// Creates a client against the public Anthropic API.
    pub fn new(model: String, api_key: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(model, api_key, ANTHROPIC_BASE_URL.to_string(), timeout)
    }

    /// Creates a client against a custom base URL.
    pub fn with_base_url(
        model: String,
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: super::build_http_client(timeout)?,
            api_key,
            model,
            base_url,
            timeout,
        })
    }
}

impl AiClient for ClaudeAiClient {
    fn send_request<'a>(
        &'a self,
        prompt: &'a Prompt,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let request = ClaudeRequest {
                model: &self.model,
                max_tokens: prompt.max_tokens,
                temperature: prompt.temperature,
                system: &prompt.system,
                messages: vec![Message {
                    role: "user",
                    content: &prompt.user,
                }],
            };

            let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
            info!(
                url = %url,
                model = %self.model,
                max_tokens = prompt.max_tokens,
                "Sending request to Claude API"
            );

            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await
                .map_err(|e| super::transport_error(&e, self.timeout))?;

            let response = super::check_error_response(response).await?;

            let claude_response: ClaudeResponse = response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponseFormat(e.to_string()))?;

            debug!(
                content_count = claude_response.content.len(),
                "Received Claude API response"
            );

            let result = claude_response
                .content
                .into_iter()
                .find(|c| c.content_type == "text")
                .map(|c| c.text)
                .ok_or_else(|| {
                    LlmError::InvalidResponseFormat("No text content in response".to_string())
                        .into()
                });

            super::log_response_success("Claude API", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "Anthropic".to_string(),
            model: self.model.clone(),
        }
    }
}
