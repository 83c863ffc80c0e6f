//! Preflight validation checks for early failure detection.
//!
//! Commands call these before reading repositories or contacting a provider
//! so that missing inputs and credentials fail fast with a clear message.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::error::ReportError;
use crate::llm::{AiProvider, ProviderConfig};

/// Result of AI credential validation.
#[derive(Debug)]
pub struct AiCredentialInfo {
    /// The provider that will be used.
    pub provider: AiProvider,
    /// The model or deployment that will be used.
    pub model: String,
}

/// Validates that credentials for the selected provider are available.
///
/// Only reads environment variables and the settings file; no client is
/// created and nothing is sent.
pub fn check_ai_credentials(model_override: Option<&str>) -> Result<AiCredentialInfo> {
    let config = ProviderConfig::from_env(model_override)?;
    Ok(AiCredentialInfo {
        provider: config.provider(),
        model: config.model().to_string(),
    })
}

/// Validates that `path` exists.
pub fn check_input_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ReportError::InputNotFound(path.to_path_buf()).into());
    }
    debug!(path = %path.display(), "Input path exists");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_provider_display() {
        assert_eq!(format!("{}", AiProvider::Azure), "Azure OpenAI");
        assert_eq!(format!("{}", AiProvider::Claude), "Claude API");
        assert_eq!(format!("{}", AiProvider::OpenAi), "OpenAI API");
        assert_eq!(format!("{}", AiProvider::Ollama), "Ollama");
    }

    #[test]
    fn missing_input_path_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = check_input_path(&missing).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::InputNotFound(path)) if *path == missing
        ));
        assert!(check_input_path(dir.path()).is_ok());
    }

    #[test]
    fn credentials_report_provider_and_model() {
        std::env::set_var("REPORTR_PROVIDER", "ollama");
        std::env::set_var("OLLAMA_MODEL", "preflight-model");
        let info = check_ai_credentials(None);
        std::env::remove_var("REPORTR_PROVIDER");
        std::env::remove_var("OLLAMA_MODEL");

        let info = info.unwrap();
        assert_eq!(info.provider, AiProvider::Ollama);
        assert_eq!(info.model, "preflight-model");
    }
}
