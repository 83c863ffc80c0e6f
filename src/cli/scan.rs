//! Security-scan commands: `llm-file-scan`, `security-scan-summary` and
//! `codeql-cwe-summary`.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};

use super::GlobalArgs;
use crate::data::cwe::cwe_table;
use crate::data::scan::{self, CweInsights, ScanFinding, UNKNOWN_CWE};
use crate::data::tree;
use crate::data::FileFilter;
use crate::error::ReportError;
use crate::llm::context::{code_samples, remediation_values};
use crate::llm::{build_prompt, CompletionClient, Placeholder, PromptValues, TemplateKind};
use crate::render::{Block, Document, Line, Panel, Span, Style};

/// File-scan options.
#[derive(Parser, Debug)]
pub struct LlmFileScanCommand {
    /// Files or directories to scan; directories expand to their code files.
    #[arg(long, num_args = 1.., required = true)]
    pub files: Vec<PathBuf>,
}

/// Severity digest options.
#[derive(Parser, Debug)]
pub struct SecurityScanSummaryCommand {
    /// JSON array of findings.
    #[arg(long)]
    pub input: PathBuf,
}

/// CWE digest options.
#[derive(Parser, Debug)]
pub struct CodeqlCweSummaryCommand {
    /// JSON array of CodeQL findings.
    #[arg(long)]
    pub input: PathBuf,

    /// Do not ask the model for remediation tips.
    #[arg(long)]
    pub skip_remediation: bool,
}

fn text_lines(text: &str, style: Style) -> Vec<Line> {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                Vec::new()
            } else {
                vec![Span::new(line, style)]
            }
        })
        .collect()
}

/// Colours the section headers of a digest.
fn digest_lines(text: &str) -> Vec<Line> {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                Vec::new()
            } else if line.contains("[PRIORITY!]") {
                vec![Span::new(line, Style::Negative)]
            } else if !line.starts_with(' ') && !line.starts_with('-') {
                vec![Span::new(line, Style::Bold)]
            } else {
                vec![Span::plain(line)]
            }
        })
        .collect()
}

impl LlmFileScanCommand {
    /// Executes the file scan.
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        for path in &self.files {
            crate::utils::check_input_path(path)?;
        }
        let client = super::connect(global)?;
        eprintln!("🔍 Calling LLM file scan...");
        let document = self.build(&client).await?;
        super::print(&document, global)
    }

    /// Files to scan, with directories expanded.
    pub fn expand_paths(&self) -> Result<Vec<PathBuf>> {
        let filter = FileFilter::code_files()?;
        let mut paths = Vec::new();
        for path in &self.files {
            if path.is_dir() {
                let files = tree::list_files(path, &filter)?;
                debug!(dir = %path.display(), files = files.len(), "Expanded directory");
                paths.extend(files.into_iter().map(|file| path.join(file)));
            } else if path.is_file() {
                paths.push(path.clone());
            } else {
                return Err(ReportError::InputNotFound(path.clone()).into());
            }
        }
        Ok(paths)
    }

    /// Sends the code to the model and lays out the issues it reports.
    pub async fn build(&self, client: &CompletionClient) -> Result<Document> {
        let paths = self.expand_paths()?;
        if paths.is_empty() {
            bail!("No code files found to scan");
        }
        info!(files = paths.len(), "Scanning files");

        let prompt = build_prompt(
            TemplateKind::LlmFileScan,
            &PromptValues::new().with(Placeholder::CodeSamples, code_samples(&paths)),
        )?;
        let answer = client.submit(&prompt).await?;
        let findings = scan::parse_model_findings(&answer)?;
        let json = serde_json::to_string_pretty(&findings).context("Failed to serialize findings")?;

        let mut document = Document::new();
        document.push(Block::Panel(Panel::new(
            "LLM Security Issues",
            text_lines(&json, Style::Code),
        )));
        document.push(Block::Panel(Panel::new(
            "Security Scan Summary (Text)",
            digest_lines(&scan::security_summary(&findings)),
        )));
        Ok(document)
    }
}

impl SecurityScanSummaryCommand {
    /// Executes the digest. No credentials are needed.
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        let document = self.build()?;
        super::print(&document, global)
    }

    /// Loads the findings and lays out the severity digest.
    pub fn build(&self) -> Result<Document> {
        let findings = scan::load_findings(&self.input)?;
        let mut document = Document::new();
        document.push(Block::Panel(Panel::new(
            "Security Scan Summary (Text)",
            digest_lines(&scan::security_summary(&findings)),
        )));
        Ok(document)
    }
}

impl CodeqlCweSummaryCommand {
    /// Executes the CWE digest.
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        let findings = scan::load_findings(&self.input)?;
        let client = if self.skip_remediation {
            None
        } else {
            Some(super::connect(global)?)
        };
        eprintln!("🧠 Analyzing CWE findings...");
        let document = self.build(&findings, client.as_ref()).await?;
        super::print(&document, global)
    }

    /// Analyses the findings, fetching one remediation tip per top CWE when a
    /// client is given.
    pub async fn build(
        &self,
        findings: &[ScanFinding],
        client: Option<&CompletionClient>,
    ) -> Result<Document> {
        let insights = CweInsights::analyze(findings);
        let table = cwe_table()?;

        let mut tips: HashMap<String, String> = HashMap::new();
        if let Some(client) = client.filter(|_| !self.skip_remediation) {
            for (cwe_id, _) in &insights.top_cwes {
                if cwe_id == UNKNOWN_CWE || tips.contains_key(cwe_id) {
                    continue;
                }
                let prompt = build_prompt(
                    TemplateKind::RemediationTip,
                    &remediation_values(cwe_id, table.get(cwe_id)),
                )?;
                let tip = client.submit(&prompt).await?;
                tips.insert(cwe_id.clone(), tip.trim().to_string());
            }
        }

        let mut document = Document::new();
        document.push(Block::Panel(Panel::new(
            "CodeQL CWE Insights",
            digest_lines(&insights.render(table, &tips)),
        )));
        Ok(document)
    }
}
