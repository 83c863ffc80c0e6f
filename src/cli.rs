//! CLI interface for reportr.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::llm::CompletionClient;
use crate::render::{self, ColorMode, Document};

pub mod config;
pub mod help;
pub mod progress;
pub mod readme;
pub mod scan;
pub mod summarize;

/// reportr: AI-written progress reports, READMEs and scan digests.
#[derive(Parser)]
#[command(name = "reportr")]
#[command(
    about = "AI-powered repository progress reports, READMEs, summaries and security-scan digests",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Options shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// When to colour output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    /// Model or deployment to use (overrides environment configuration).
    #[arg(long, global = true)]
    pub model: Option<String>,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Summarizes recent git activity with an AI-written progress report.
    #[command(name = "progress-report")]
    ProgressReport(progress::ProgressReportCommand),
    /// Generates a README for a repository and prints it as Markdown.
    #[command(name = "generate-readme")]
    GenerateReadme(readme::GenerateReadmeCommand),
    /// Summarizes a repository from its whole file tree in one prompt.
    #[command(name = "summarize-overview")]
    SummarizeOverview(summarize::SummarizeOverviewCommand),
    /// Summarizes a repository directory by directory.
    #[command(name = "summarize-details")]
    SummarizeDetails(summarize::SummarizeDetailsCommand),
    /// Asks the model to find security issues in source files.
    #[command(name = "llm-file-scan")]
    LlmFileScan(scan::LlmFileScanCommand),
    /// Digests a security-scan JSON file by severity.
    #[command(name = "security-scan-summary")]
    SecurityScanSummary(scan::SecurityScanSummaryCommand),
    /// Digests CodeQL findings by CWE with remediation tips.
    #[command(name = "codeql-cwe-summary")]
    CodeqlCweSummary(scan::CodeqlCweSummaryCommand),
    /// Configuration and prompt template information.
    Config(config::ConfigCommand),
    /// Displays comprehensive help for all commands.
    #[command(name = "help-all")]
    HelpAll(help::HelpCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        let global = self.global;
        match self.command {
            Commands::ProgressReport(cmd) => cmd.execute(&global).await,
            Commands::GenerateReadme(cmd) => cmd.execute(&global).await,
            Commands::SummarizeOverview(cmd) => cmd.execute(&global).await,
            Commands::SummarizeDetails(cmd) => cmd.execute(&global).await,
            Commands::LlmFileScan(cmd) => cmd.execute(&global).await,
            Commands::SecurityScanSummary(cmd) => cmd.execute(&global),
            Commands::CodeqlCweSummary(cmd) => cmd.execute(&global).await,
            Commands::Config(cmd) => cmd.execute(&global),
            Commands::HelpAll(cmd) => cmd.execute(),
        }
    }
}

/// Creates the completion client and reports which provider is used.
pub(crate) fn connect(global: &GlobalArgs) -> Result<CompletionClient> {
    let client = crate::llm::create_default_client(global.model.as_deref())?;
    let metadata = client.get_ai_client_metadata();
    eprintln!("Using {} (model: {})", metadata.provider, metadata.model);
    Ok(client)
}

/// Prints a finished document to stdout.
pub(crate) fn print(document: &Document, global: &GlobalArgs) -> Result<()> {
    render::print_document(document, global.color)?;
    Ok(())
}
