//! Embedded prompt templates and typed placeholder substitution.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use regex::{Captures, Regex};
use serde::Deserialize;

/// Marker substituted for placeholders that have no value.
pub const UNKNOWN_VALUE: &str = "<unknown>";

/// Raw YAML of the embedded templates.
pub const TEMPLATES_YAML: &str = include_str!("../templates/prompts.yaml");

/// Every placeholder a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    /// `{report_context}`: the progress context.
    ReportContext,
    /// `{analysis_context}`: the project profile.
    AnalysisContext,
    /// `{structure_json}`: the tree snapshot as JSON.
    StructureJson,
    /// `{path}`: a directory path.
    Path,
    /// `{file_contents}`: concatenated file contents.
    FileContents,
    /// `{code_samples}`: code to scan.
    CodeSamples,
    /// `{cwe_id}`.
    CweId,
    /// `{cwe_title}`.
    CweTitle,
    /// `{cwe_description}`.
    CweDescription,
}

impl Placeholder {
    /// Name as written between braces in a template.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReportContext => "report_context",
            Self::AnalysisContext => "analysis_context",
            Self::StructureJson => "structure_json",
            Self::Path => "path",
            Self::FileContents => "file_contents",
            Self::CodeSamples => "code_samples",
            Self::CweId => "cwe_id",
            Self::CweTitle => "cwe_title",
            Self::CweDescription => "cwe_description",
        }
    }
}

impl FromStr for Placeholder {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "report_context" => Self::ReportContext,
            "analysis_context" => Self::AnalysisContext,
            "structure_json" => Self::StructureJson,
            "path" => Self::Path,
            "file_contents" => Self::FileContents,
            "code_samples" => Self::CodeSamples,
            "cwe_id" => Self::CweId,
            "cwe_title" => Self::CweTitle,
            "cwe_description" => Self::CweDescription,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

/// Values for a template's placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptValues(BTreeMap<Placeholder, String>);

impl PromptValues {
    /// Creates an empty value map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one placeholder, consuming and returning the map.
    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.0.insert(placeholder, value.into());
        self
    }

    /// Returns the value for a placeholder.
    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.0.get(&placeholder).map(String::as_str)
    }
}

/// A fully substituted prompt ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// System prompt.
    pub system: String,
    /// User prompt.
    pub user: String,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Which embedded template to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// `progress-report`.
    ProgressReport,
    /// `generate-readme`.
    GenerateReadme,
    /// `summarize-overview`.
    SummarizeOverview,
    /// `summarize-details`, one prompt per directory.
    SummarizeDetails,
    /// `llm-file-scan`.
    LlmFileScan,
    /// One-line CWE remediation tip.
    RemediationTip,
}

/// One template as stored in YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PromptTemplate {
    /// System prompt text.
    pub system: String,
    /// User prompt text with placeholders.
    pub user: String,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// All embedded templates.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplates {
    progress_report: PromptTemplate,
    generate_readme: PromptTemplate,
    summarize_overview: PromptTemplate,
    summarize_details: PromptTemplate,
    llm_file_scan: PromptTemplate,
    remediation_tip: PromptTemplate,
}

impl PromptTemplates {
    /// Parses the embedded templates.
    pub fn load() -> Result<Self> {
        serde_yaml::from_str(TEMPLATES_YAML).context("Failed to parse embedded prompt templates")
    }

    /// Returns the template for `kind`.
    pub fn get(&self, kind: TemplateKind) -> &PromptTemplate {
        match kind {
            TemplateKind::ProgressReport => &self.progress_report,
            TemplateKind::GenerateReadme => &self.generate_readme,
            TemplateKind::SummarizeOverview => &self.summarize_overview,
            TemplateKind::SummarizeDetails => &self.summarize_details,
            TemplateKind::LlmFileScan => &self.llm_file_scan,
            TemplateKind::RemediationTip => &self.remediation_tip,
        }
    }
}

static TEMPLATES: OnceLock<PromptTemplates> = OnceLock::new();
static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

/// The process-wide template set.
pub fn templates() -> Result<&'static PromptTemplates> {
    if let Some(templates) = TEMPLATES.get() {
        return Ok(templates);
    }
    let loaded = PromptTemplates::load()?;
    Ok(TEMPLATES.get_or_init(|| loaded))
}

fn placeholder_regex() -> Result<&'static Regex> {
    if let Some(re) = PLACEHOLDER_RE.get() {
        return Ok(re);
    }
    let re = Regex::new(r"\{([a-z_]+)\}").map_err(|e| anyhow!("Invalid placeholder pattern: {e}"))?;
    Ok(PLACEHOLDER_RE.get_or_init(|| re))
}

/// Substitutes known placeholders in `text` in a single pass.
///
/// Known placeholders without a value become [`UNKNOWN_VALUE`]; unknown brace
/// groups are kept verbatim. Substituted values are not scanned again.
pub fn render(text: &str, values: &PromptValues) -> Result<String> {
    let re = placeholder_regex()?;
    let rendered = re.replace_all(text, |caps: &Captures<'_>| {
        caps[1].parse::<Placeholder>().map_or_else(
            |()| caps[0].to_string(),
            |placeholder| values.get(placeholder).unwrap_or(UNKNOWN_VALUE).to_string(),
        )
    });
    Ok(rendered.into_owned())
}

impl PromptTemplate {
    /// Builds a prompt from this template.
    pub fn build(&self, values: &PromptValues) -> Result<Prompt> {
        Ok(Prompt {
            system: render(self.system.trim_end(), values)?,
            user: render(self.user.trim_end(), values)?,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        })
    }
}

/// Builds a prompt from the embedded template of `kind`.
pub fn build_prompt(kind: TemplateKind, values: &PromptValues) -> Result<Prompt> {
    templates()?.get(kind).build(values)
}
