//! OpenAI-compatible chat completions client (OpenAI, Ollama).

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

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default local Ollama base URL.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Chat message.
#[derive(Serialize, Debug)]
pub(super) struct Message {
    pub(super) role: &'static str,
    pub(super) content: String,
}

/// Builds the system/user message pair, omitting an empty system prompt.
pub(super) fn chat_messages(prompt: &Prompt) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if !prompt.system.is_empty() {
        messages.push(Message {
            role: "system",
            content: prompt.system.clone(),
        });
    }
    messages.push(Message {
        role: "user",
        content: prompt.user.clone(),
    });
    messages
}

/// Chat completions request body.
#[derive(Serialize, Debug)]
pub(super) struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

impl ChatRequest {
    pub(super) fn new(model: Option<String>, prompt: &Prompt) -> Self {
        Self {
            model,
            messages: chat_messages(prompt),
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
            stream: false,
        }
    }
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

/// Chat completions response body.
#[derive(Deserialize, Debug)]
pub(super) struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

impl ChatResponse {
    /// Text of the first choice.
    pub(super) fn into_text(self) -> Result<String> {
        debug!(
            choice_count = self.choices.len(),
            usage = ?self.usage,
            "Received chat completions response"
        );
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                LlmError::InvalidResponseFormat("No choices in response".to_string()).into()
            })
    }
}

/// Sends a chat request and extracts the first choice's text.
pub(super) async fn post_chat(
    request: reqwest::RequestBuilder,
    body: &impl Serialize,
    timeout: Duration,
) -> Result<String> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| super::transport_error(&e, timeout))?;

    let response = super::check_error_response(response).await?;

    let chat: ChatResponse = response
        .json()
        .await
        .map_err(|e| LlmError::InvalidResponseFormat(e.to_string()))?;
    chat.into_text()
}

/// OpenAI-compatible API client.
pub struct OpenAiAiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiAiClient {
    /// Creates a client for any OpenAI-compatible endpoint.
    pub fn new(
        model: String,
        api_key: Option<String>,
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

    /// Creates a client for a local Ollama server (no API key).
    pub fn new_ollama(model: String, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        Self::new(
            model,
            None,
            base_url.unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
            timeout,
        )
    }

    fn api_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn is_ollama(&self) -> bool {
        self.api_key.is_none()
    }
}

impl AiClient for OpenAiAiClient {
    fn send_request<'a>(
        &'a self,
        prompt: &'a Prompt,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let request = ChatRequest::new(Some(self.model.clone()), prompt);
            debug!(
                system_prompt_len = prompt.system.len(),
                user_prompt_len = prompt.user.len(),
                max_tokens = request.max_tokens,
                temperature = request.temperature,
                is_ollama = self.is_ollama(),
                "Built OpenAI-compatible request payload"
            );

            let api_url = self.api_url();
            info!(url = %api_url, model = %self.model, "Sending request to OpenAI-compatible API");

            let mut builder = self.client.post(&api_url);
            if let Some(api_key) = &self.api_key {
                builder = builder.header("Authorization", format!("Bearer {api_key}"));
            }

            let result = post_chat(builder, &request, self.timeout).await;
            super::log_response_success("OpenAI-compatible", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: if self.is_ollama() { "Ollama" } else { "OpenAI" }.to_string(),
            model: self.model.clone(),
        }
    }
}
