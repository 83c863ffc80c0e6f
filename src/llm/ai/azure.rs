//! Azure OpenAI chat completions client.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::openai::{post_chat, ChatRequest};
use super::{AiClient, AiClientMetadata};
use crate::llm::error::LlmError;
use crate::llm::prompts::Prompt;

/// Deployment name used when none is configured.
pub const DEFAULT_DEPLOYMENT: &str = "reportr";

/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Azure OpenAI client bound to one deployment.
pub struct AzureAiClient {
    client: Client,
    api_key: String,
    endpoint: Url,
    deployment: String,
    api_version: String,
    timeout: Duration,
}

impl AzureAiClient {
    /// Creates a client for `endpoint` (e.g. `https://name.openai.azure.com`).
    pub fn new(
        endpoint: &str,
        api_key: String,
        deployment: String,
        api_version: String,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}/", endpoint.trim_end_matches('/')))
            .map_err(|e| LlmError::InvalidConfiguration(format!("endpoint '{endpoint}': {e}")))?;
        Ok(Self {
            client: super::build_http_client(timeout)?,
            api_key,
            endpoint,
            deployment,
            api_version,
            timeout,
        })
    }

    /// Full chat completions URL for the deployment.
    pub fn api_url(&self) -> Result<Url> {
        let mut url = self
            .endpoint
            .join(&format!(
                "openai/deployments/{}/chat/completions",
                self.deployment
            ))
            .map_err(|e| LlmError::InvalidConfiguration(format!("deployment URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

impl AiClient for AzureAiClient {
    fn send_request<'a>(
        &'a self,
        prompt: &'a Prompt,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let request = ChatRequest::new(None, prompt);
            debug!(
                system_prompt_len = prompt.system.len(),
                user_prompt_len = prompt.user.len(),
                max_tokens = prompt.max_tokens,
                temperature = prompt.temperature,
                "Built Azure OpenAI request payload"
            );

            let api_url = self.api_url()?;
            info!(
                url = %api_url,
                deployment = %self.deployment,
                "Sending request to Azure OpenAI"
            );

            let builder = self
                .client
                .post(api_url)
                .header("api-key", &self.api_key);

            let result = post_chat(builder, &request, self.timeout).await;
            super::log_response_success("Azure OpenAI", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "Azure OpenAI".to_string(),
            model: self.deployment.clone(),
        }
    }
}
