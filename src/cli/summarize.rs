//! `summarize-overview` and `summarize-details` commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use super::GlobalArgs;
use crate::data::tree::{self, TreeSnapshot};
use crate::data::FileFilter;
use crate::error::ReportError;
use crate::llm::context::{details_values, directory_contents};
use crate::llm::{build_prompt, CompletionClient, Placeholder, PromptValues, TemplateKind};
use crate::render::{
    format_markdown, key_value, Block, Document, Line, MarkdownMode, Panel, Span, Style,
};

/// Whole-tree summary options.
#[derive(Parser, Debug)]
pub struct SummarizeOverviewCommand {
    /// Repository to summarize.
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

/// Per-directory summary options.
#[derive(Parser, Debug)]
pub struct SummarizeDetailsCommand {
    /// Repository to summarize.
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

/// Validates the size of `root` and captures its included files.
fn checked_snapshot(root: &Path, filter: &FileFilter) -> Result<TreeSnapshot> {
    if !root.is_dir() {
        return Err(ReportError::InputNotFound(root.to_path_buf()).into());
    }
    let stats = tree::validate_size(root, filter)?;
    info!(files = stats.files, megabytes = stats.megabytes(), "Repository validated");
    TreeSnapshot::capture(root, filter)
}

fn directory_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned())
}

impl SummarizeOverviewCommand {
    /// Executes the overview command.
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        crate::utils::check_input_path(&self.path)?;
        let client = super::connect(global)?;
        eprintln!("🔎 Generating full directory analysis...");
        let document = self.build(&client).await?;
        super::print(&document, global)
    }

    /// Sends the whole tree as JSON and lays out the answer.
    pub async fn build(&self, client: &CompletionClient) -> Result<Document> {
        let filter = FileFilter::code_files()?;
        let snapshot = checked_snapshot(&self.path, &filter)?;
        let structure_json = snapshot.to_json()?;
        debug!(json_len = structure_json.len(), "Serialized file tree");

        let prompt = build_prompt(
            TemplateKind::SummarizeOverview,
            &PromptValues::new().with(Placeholder::StructureJson, structure_json),
        )?;
        let summary = client.submit(&prompt).await?;

        let (files, folders) = snapshot.counts();
        let file_types: Vec<String> = snapshot
            .file_types()
            .iter()
            .map(|(ext, count)| format!("{ext} ({count})"))
            .collect();

        let mut lines: Vec<Line> = vec![
            vec![Span::new("Full Directory Analysis", Style::Title)],
            Vec::new(),
            key_value("Directory", directory_name(&self.path)),
            key_value("Analysis Method", "Summarized Overview"),
            key_value("Path", self.path.display().to_string()),
            key_value("Contents", format!("{files} files in {folders} folders")),
        ];
        if !file_types.is_empty() {
            lines.push(key_value("File Types", file_types.join(", ")));
        }
        lines.push(Vec::new());
        lines.push(vec![Span::new("Detailed Analysis:", Style::Title)]);
        lines.extend(format_markdown(&summary, MarkdownMode::Styled));

        let mut document = Document::new();
        document.push(Block::Panel(Panel::new("Repository Summary", lines)));
        Ok(document)
    }
}

impl SummarizeDetailsCommand {
    /// Executes the per-directory command.
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        crate::utils::check_input_path(&self.path)?;
        let client = super::connect(global)?;
        eprintln!("🔎 Summarizing directories...");
        let document = self.build(&client).await?;
        super::print(&document, global)
    }

    /// Sends one prompt per directory, in sorted order, and lays out the answers.
    pub async fn build(&self, client: &CompletionClient) -> Result<Document> {
        let filter = FileFilter::code_files()?;
        let snapshot = checked_snapshot(&self.path, &filter)?;
        let groups = tree::files_by_directory(&self.path, &filter)?;

        let mut lines: Vec<Line> = vec![vec![Span::new("Directory Tree:", Style::Title)]];
        for entry in snapshot.text_tree() {
            let style = if entry.is_folder { Style::Folder } else { Style::File };
            lines.push(vec![Span::plain(entry.prefix), Span::new(entry.name, style)]);
        }
        lines.push(Vec::new());
        lines.push(vec![Span::new("Summaries:", Style::Title)]);
        if groups.is_empty() {
            lines.push(vec![Span::new("No files to summarize.", Style::Muted)]);
        }

        for (dir, files) in &groups {
            let dir_path = if dir.as_os_str() == "." {
                self.path.clone()
            } else {
                self.path.join(dir)
            };
            let display_path = dir_path.display().to_string();
            eprintln!("  Summarizing {display_path} ({} files)", files.len());

            let contents = directory_contents(&dir_path, files);
            let prompt = build_prompt(
                TemplateKind::SummarizeDetails,
                &details_values(&display_path, contents),
            )?;
            let summary = client.submit(&prompt).await?;

            lines.push(Vec::new());
            lines.push(vec![
                Span::new("Directory: ", Style::Folder),
                Span::plain(display_path),
            ]);
            lines.push(vec![Span::new("Summary:", Style::Positive)]);
            lines.extend(format_markdown(&summary, MarkdownMode::Styled));
        }

        let mut document = Document::new();
        document.push(Block::Panel(Panel::new("Repository Directory Summary", lines)));
        Ok(document)
    }
}
