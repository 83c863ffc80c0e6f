//! Completion provider errors.

use thiserror::Error;

/// Errors raised by completion providers before they are classified as a
/// failed generation.
#[derive(Error, Debug)]
pub enum LlmError {
    /// No credentials configured for the selected provider.
    #[error("{provider} credentials not found. Set {variables}")]
    CredentialsNotFound {
        /// Provider display name.
        provider: String,
        /// Variables that would satisfy the check.
        variables: String,
    },

    /// The provider configuration is unusable.
    #[error("Invalid provider configuration: {0}")]
    InvalidConfiguration(String),

    /// The API answered with a non-success status.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// The API answered with an unexpected body.
    #[error("Invalid response format: {0}")]
    InvalidResponseFormat(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    NetworkError(String),
}
