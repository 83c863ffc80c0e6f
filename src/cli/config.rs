//! Configuration-related CLI commands.

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::GlobalArgs;
use crate::llm::prompts::TEMPLATES_YAML;
use crate::utils::check_ai_credentials;

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Shows the embedded prompt templates.
    Prompts(PromptsCommand),
    /// Shows the provider and model the current environment selects.
    Provider(ProviderCommand),
}

/// Prompts command options.
#[derive(Parser)]
pub struct PromptsCommand {}

/// Provider command options.
#[derive(Parser)]
pub struct ProviderCommand {}

impl ConfigCommand {
    /// Executes the config command.
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        match self.command {
            ConfigSubcommands::Prompts(cmd) => cmd.execute(),
            ConfigSubcommands::Provider(cmd) => cmd.execute(global),
        }
    }
}

impl PromptsCommand {
    /// Prints the embedded prompts.yaml.
    pub fn execute(self) -> Result<()> {
        println!("{TEMPLATES_YAML}");
        Ok(())
    }
}

impl ProviderCommand {
    /// Prints the resolved provider without contacting it.
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        let ai_info = check_ai_credentials(global.model.as_deref())?;
        println!("Provider: {}", ai_info.provider);
        println!("Model: {}", ai_info.model);
        if let Ok(path) = crate::utils::Settings::get_settings_path() {
            println!("Settings file: {}", path.display());
        }
        Ok(())
    }
}
