//! Completion provider trait and shared HTTP helpers.

pub mod azure;
pub mod claude;
pub mod openai;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use super::error::LlmError;
use super::prompts::Prompt;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Metadata about a provider client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiClientMetadata {
    /// Service provider name.
    pub provider: String,
    /// Model or deployment identifier.
    pub model: String,
}

/// Builds an HTTP client with the given request timeout.
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Classifies a transport error.
pub(crate) fn transport_error(err: &reqwest::Error, timeout: Duration) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout(timeout.as_secs())
    } else {
        LlmError::NetworkError(err.to_string())
    }
}

/// Passes a success response through; turns anything else into
/// [`LlmError::ApiRequestFailed`] carrying the status and body.
pub(crate) async fn check_error_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_else(|e| {
        tracing::debug!("Failed to read error response body: {e}");
        String::new()
    });
    Err(LlmError::ApiRequestFailed(format!("HTTP {status}: {error_text}")).into())
}

/// Logs successful text extraction from a provider response.
pub(crate) fn log_response_success(provider: &str, result: &Result<String>) {
    if let Ok(text) = result {
        tracing::debug!(
            response_len = text.len(),
            "Extracted text content from {} response",
            provider
        );
    }
}

/// A completion API.
pub trait AiClient: Send + Sync {
    /// Sends one prompt and returns the raw completion text.
    fn send_request<'a>(
        &'a self,
        prompt: &'a Prompt,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Returns metadata about the client.
    fn get_metadata(&self) -> AiClientMetadata;
}
