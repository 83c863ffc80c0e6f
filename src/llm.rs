//! Completion API integration: prompt templates, context builders and providers.

pub mod ai;
pub mod client;
pub mod context;
pub mod error;
pub mod prompts;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::{create_default_client, AiProvider, CompletionClient, ProviderConfig};
pub use error::LlmError;
pub use prompts::{build_prompt, Placeholder, Prompt, PromptValues, TemplateKind};
