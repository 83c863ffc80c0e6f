//! Completion client and provider selection.

use std::fmt;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{debug, info};

use super::ai::azure::{AzureAiClient, DEFAULT_API_VERSION, DEFAULT_DEPLOYMENT};
use super::ai::claude::{ClaudeAiClient, DEFAULT_CLAUDE_MODEL};
use super::ai::openai::{OpenAiAiClient, OPENAI_BASE_URL};
use super::ai::{AiClient, AiClientMetadata, DEFAULT_TIMEOUT_SECS};
use super::error::LlmError;
use super::prompts::Prompt;
use crate::error::ReportError;

/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

/// Completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    /// Azure OpenAI deployments.
    Azure,
    /// The OpenAI API.
    OpenAi,
    /// A local Ollama server.
    Ollama,
    /// The Anthropic messages API.
    Claude,
}

impl AiProvider {
    /// Parses a `REPORTR_PROVIDER` value.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "azure" | "azure-openai" => Ok(Self::Azure),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "claude" | "anthropic" => Ok(Self::Claude),
            other => bail!(
                "Unknown provider '{other}' in REPORTR_PROVIDER (expected azure, openai, ollama or claude)"
            ),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Azure => write!(f, "Azure OpenAI"),
            Self::OpenAi => write!(f, "OpenAI API"),
            Self::Ollama => write!(f, "Ollama"),
            Self::Claude => write!(f, "Claude API"),
        }
    }
}

/// Fully resolved provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// Azure OpenAI deployment.
    Azure {
        /// Resource endpoint URL.
        endpoint: String,
        /// API key.
        api_key: String,
        /// Deployment name.
        deployment: String,
        /// `api-version` query value.
        api_version: String,
    },
    /// OpenAI or a compatible endpoint.
    OpenAi {
        /// Bearer token.
        api_key: String,
        /// Model name.
        model: String,
        /// Base URL without the `/v1` path.
        base_url: String,
    },
    /// Local Ollama server.
    Ollama {
        /// Model name.
        model: String,
        /// Base URL; the local default when `None`.
        base_url: Option<String>,
    },
    /// Anthropic messages API.
    Claude {
        /// API key.
        api_key: String,
        /// Model name.
        model: String,
    },
}

fn missing(provider: AiProvider, variables: &str) -> anyhow::Error {
    ReportError::GenerationFailed(
        LlmError::CredentialsNotFound {
            provider: provider.to_string(),
            variables: variables.to_string(),
        }
        .to_string(),
    )
    .into()
}

impl ProviderConfig {
    /// Resolves the provider from variables available through `lookup`.
    ///
    /// Missing credentials are a [`ReportError::GenerationFailed`].
    pub fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        model_override: Option<&str>,
    ) -> Result<Self> {
        let provider = AiProvider::parse(&lookup("REPORTR_PROVIDER").unwrap_or_default())?;
        let model = |key: &str, default: &str| {
            model_override
                .map(String::from)
                .or_else(|| lookup(key))
                .unwrap_or_else(|| default.to_string())
        };

        let config = match provider {
            AiProvider::Azure => {
                let api_key = lookup("AZURE_OPENAI_KEY")
                    .ok_or_else(|| missing(provider, "AZURE_OPENAI_KEY and AZURE_OPENAI_ENDPOINT"))?;
                let endpoint = lookup("AZURE_OPENAI_ENDPOINT")
                    .ok_or_else(|| missing(provider, "AZURE_OPENAI_ENDPOINT"))?;
                Self::Azure {
                    endpoint,
                    api_key,
                    deployment: model("AZURE_OPENAI_DEPLOYMENT", DEFAULT_DEPLOYMENT),
                    api_version: lookup("AZURE_OPENAI_API_VERSION")
                        .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
                }
            }
            AiProvider::OpenAi => Self::OpenAi {
                api_key: lookup("OPENAI_API_KEY")
                    .ok_or_else(|| missing(provider, "OPENAI_API_KEY"))?,
                model: model("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            },
            AiProvider::Ollama => Self::Ollama {
                model: model("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
                base_url: lookup("OLLAMA_BASE_URL"),
            },
            AiProvider::Claude => Self::Claude {
                api_key: lookup("ANTHROPIC_API_KEY")
                    .or_else(|| lookup("CLAUDE_API_KEY"))
                    .ok_or_else(|| missing(provider, "ANTHROPIC_API_KEY or CLAUDE_API_KEY"))?,
                model: model("ANTHROPIC_MODEL", DEFAULT_CLAUDE_MODEL),
            },
        };

        debug!(provider = %config.provider(), model = %config.model(), "Resolved completion provider");
        Ok(config)
    }

    /// Resolves the provider from the environment and settings file.
    pub fn from_env(model_override: Option<&str>) -> Result<Self> {
        Self::resolve(
            |key| crate::utils::settings::get_env_var(key).ok(),
            model_override,
        )
    }

    /// Which provider this is.
    pub const fn provider(&self) -> AiProvider {
        match self {
            Self::Azure { .. } => AiProvider::Azure,
            Self::OpenAi { .. } => AiProvider::OpenAi,
            Self::Ollama { .. } => AiProvider::Ollama,
            Self::Claude { .. } => AiProvider::Claude,
        }
    }

    /// Model or deployment name.
    pub fn model(&self) -> &str {
        match self {
            Self::Azure { deployment, .. } => deployment,
            Self::OpenAi { model, .. } | Self::Ollama { model, .. } | Self::Claude { model, .. } => {
                model
            }
        }
    }

    /// Instantiates the provider client.
    pub fn build(self, timeout: Duration) -> Result<Box<dyn AiClient>> {
        Ok(match self {
            Self::Azure {
                endpoint,
                api_key,
                deployment,
                api_version,
            } => Box::new(AzureAiClient::new(
                &endpoint,
                api_key,
                deployment,
                api_version,
                timeout,
            )?),
            Self::OpenAi {
                api_key,
                model,
                base_url,
            } => Box::new(OpenAiAiClient::new(model, Some(api_key), base_url, timeout)?),
            Self::Ollama { model, base_url } => {
                Box::new(OpenAiAiClient::new_ollama(model, base_url, timeout)?)
            }
            Self::Claude { api_key, model } => {
                Box::new(ClaudeAiClient::new(model, api_key, timeout)?)
            }
        })
    }
}

/// Request timeout from `REPORTR_TIMEOUT_SECS`, defaulting to two minutes.
pub fn request_timeout(lookup: impl Fn(&str) -> Option<String>) -> Duration {
    let secs = lookup("REPORTR_TIMEOUT_SECS")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Sends prompts to one completion provider.
pub struct CompletionClient {
    ai_client: Box<dyn AiClient>,
}

impl CompletionClient {
    /// Wraps a provider client.
    pub fn new(ai_client: Box<dyn AiClient>) -> Self {
        Self { ai_client }
    }

    /// Provider metadata.
    pub fn get_ai_client_metadata(&self) -> AiClientMetadata {
        self.ai_client.get_metadata()
    }

    /// Sends `prompt` once and returns the completion text.
    ///
    /// Every failure is reported as [`ReportError::GenerationFailed`]; nothing
    /// is retried.
    pub async fn submit(&self, prompt: &Prompt) -> Result<String> {
        let metadata = self.ai_client.get_metadata();
        info!(
            provider = %metadata.provider,
            model = %metadata.model,
            user_prompt_len = prompt.user.len(),
            "Submitting prompt"
        );

        self.ai_client.send_request(prompt).await.map_err(|e| {
            ReportError::GenerationFailed(format!("{} ({}): {e:#}", metadata.provider, metadata.model))
                .into()
        })
    }
}

/// Creates a completion client from the environment and settings file.
pub fn create_default_client(model_override: Option<&str>) -> Result<CompletionClient> {
    let config = ProviderConfig::from_env(model_override)?;
    let timeout = request_timeout(|key| crate::utils::settings::get_env_var(key).ok());
    Ok(CompletionClient::new(config.build(timeout)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::test_utils::ConfigurableMockAiClient;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn prompt() -> Prompt {
        Prompt {
            system: String::new(),
            user: "u".to_string(),
            max_tokens: 1,
            temperature: 0.0,
        }
    }

    #[test]
    fn azure_is_the_default_provider() {
        let config = ProviderConfig::resolve(
            lookup(&[
                ("AZURE_OPENAI_KEY", "k"),
                ("AZURE_OPENAI_ENDPOINT", "https://x.openai.azure.com"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(config.provider(), AiProvider::Azure);
        assert_eq!(config.model(), DEFAULT_DEPLOYMENT);
        assert!(matches!(
            config,
            ProviderConfig::Azure { ref api_version, .. } if api_version == DEFAULT_API_VERSION
        ));
    }

    #[test]
    fn model_override_wins() {
        let config = ProviderConfig::resolve(
            lookup(&[
                ("REPORTR_PROVIDER", "openai"),
                ("OPENAI_API_KEY", "sk"),
                ("OPENAI_MODEL", "gpt-env"),
            ]),
            Some("gpt-flag"),
        )
        .unwrap();
        assert_eq!(config.model(), "gpt-flag");
    }

    #[test]
    fn missing_credentials_fail_generation() {
        let err = ProviderConfig::resolve(lookup(&[]), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::GenerationFailed(_))
        ));
        assert!(err.to_string().contains("AZURE_OPENAI_KEY"));
    }

    #[test]
    fn ollama_needs_no_key() {
        let config =
            ProviderConfig::resolve(lookup(&[("REPORTR_PROVIDER", "ollama")]), None).unwrap();
        assert_eq!(
            config,
            ProviderConfig::Ollama {
                model: DEFAULT_OLLAMA_MODEL.to_string(),
                base_url: None,
            }
        );
    }

    #[test]
    fn claude_accepts_either_key() {
        let config = ProviderConfig::resolve(
            lookup(&[("REPORTR_PROVIDER", "claude"), ("CLAUDE_API_KEY", "ck")]),
            None,
        )
        .unwrap();
        assert_eq!(config.provider(), AiProvider::Claude);
        assert_eq!(config.provider().to_string(), "Claude API");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(AiProvider::parse("bard").is_err());
        assert_eq!(AiProvider::parse("Azure").unwrap(), AiProvider::Azure);
    }

    #[test]
    fn timeout_defaults_and_overrides() {
        assert_eq!(request_timeout(lookup(&[])), Duration::from_secs(120));
        assert_eq!(
            request_timeout(lookup(&[("REPORTR_TIMEOUT_SECS", "7")])),
            Duration::from_secs(7)
        );
        assert_eq!(
            request_timeout(lookup(&[("REPORTR_TIMEOUT_SECS", "soon")])),
            Duration::from_secs(120)
        );
    }

    #[tokio::test]
    async fn submit_returns_completion_text() {
        let mock = ConfigurableMockAiClient::new(vec![Ok("done".to_string())]);
        let prompts = mock.prompt_handle();
        let client = CompletionClient::new(Box::new(mock));

        assert_eq!(client.submit(&prompt()).await.unwrap(), "done");
        assert_eq!(prompts.prompts(), vec![(String::new(), "u".to_string())]);
    }

    #[tokio::test]
    async fn submit_failure_is_generation_failed_without_retry() {
        let mock = ConfigurableMockAiClient::new(vec![
            Err(anyhow::anyhow!("connection reset")),
            Ok("never used".to_string()),
        ]);
        let responses = mock.response_handle();
        let client = CompletionClient::new(Box::new(mock));

        let err = client.submit(&prompt()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::GenerationFailed(msg)) if msg.contains("connection reset")
        ));
        assert_eq!(responses.remaining(), 1);
    }
}
