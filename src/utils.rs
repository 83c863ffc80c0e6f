//! Utility functions and helpers.

pub mod preflight;
pub mod settings;

pub use preflight::{check_ai_credentials, check_input_path, AiCredentialInfo};
pub use settings::{get_env_var, Settings};
