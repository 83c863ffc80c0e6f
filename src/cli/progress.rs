//! `progress-report` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use super::GlobalArgs;
use crate::data::stats::{aggregate, ActivitySummary};
use crate::git::{Attribution, GitRepository, History, HistoryReader, ReportRequest, TimeWindow};
use crate::llm::context::progress_context;
use crate::llm::{build_prompt, CompletionClient, Placeholder, PromptValues, TemplateKind};
use crate::render::{
    format_markdown, key_value, Block, Column, Document, MarkdownMode, Panel, Span, Style, Table,
};

/// Commits listed in the recent-commits table.
pub const COMMIT_TABLE_ROWS: usize = 10;

/// Longest commit subject shown before truncation.
const MESSAGE_WIDTH: usize = 50;

/// Progress report options.
#[derive(Parser, Debug)]
pub struct ProgressReportCommand {
    /// Repository to analyse.
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Days of history to include (0 for all time).
    #[arg(long, default_value_t = 30)]
    pub days: u32,

    /// Only include commits by this author name or email (repeatable).
    #[arg(long)]
    pub username: Vec<String>,

    /// Branch to analyse (defaults to main, then master).
    #[arg(long)]
    pub branch: Option<String>,

    /// Include merge commits.
    #[arg(long)]
    pub include_merges: bool,
}

impl ProgressReportCommand {
    /// Executes the progress report command.
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        crate::utils::check_input_path(&self.path)?;
        let client = super::connect(global)?;
        eprintln!("🚀 Generating progress report...");
        let document = self.build(&client).await?;
        super::print(&document, global)
    }

    /// Request described by the command options.
    pub fn request(&self) -> ReportRequest {
        ReportRequest {
            authors: self.username.clone(),
            branch: self.branch.clone(),
            include_merges: self.include_merges,
            ..ReportRequest::new(TimeWindow::from_days(self.days))
        }
    }

    /// Reads the history, asks the model for a report and assembles the output.
    pub async fn build(&self, client: &CompletionClient) -> Result<Document> {
        let request = self.request();
        let repo = GitRepository::open_at(&self.path)?;
        let history = HistoryReader::new(&repo).read(&request)?;
        let summary = aggregate(&history.commits);

        let context = progress_context(&history, &request, &summary);
        debug!(context_len = context.len(), "Built progress context");
        let prompt = build_prompt(
            TemplateKind::ProgressReport,
            &PromptValues::new().with(Placeholder::ReportContext, context),
        )?;
        let report = client.submit(&prompt).await?;

        Ok(progress_document(&history, &request, &summary, &report))
    }
}

/// Lays out a progress report around the model's answer.
pub fn progress_document(
    history: &History,
    request: &ReportRequest,
    summary: &ActivitySummary,
    report: &str,
) -> Document {
    let mut document = Document::new();

    let mut overview = vec![
        key_value("Repository", history.repo_name.clone()),
        key_value("Branch", history.branch.clone()),
        key_value("Analysis Period", request.time_window.label()),
        key_value("Filter", request.filter_label()),
        key_value("Total Commits", summary.total_commits.to_string()),
    ];
    if summary.unattributed.commits > 0 {
        overview.push(key_value(
            "Unattributed Commits",
            summary.unattributed.commits.to_string(),
        ));
    }
    document.push(Block::Panel(
        Panel::new("Repository Overview", overview).with_border(Style::Heading),
    ));

    document.push(Block::Table(contributor_table(summary)));
    if !history.commits.is_empty() {
        document.push(Block::Table(commit_table(history)));
    }

    document.push(Block::Panel(
        Panel::new(
            "📊 AI-Generated Progress Report",
            format_markdown(report, MarkdownMode::Styled),
        )
        .with_border(Style::Heading),
    ));
    document
}

fn contributor_table(summary: &ActivitySummary) -> Table {
    let mut table = Table::new(
        "Contributors Summary",
        vec![
            Column::left("Contributor", Style::Label),
            Column::right("Commits", Style::Metric),
            Column::right("Lines Added", Style::Positive),
            Column::right("Lines Deleted", Style::Negative),
            Column::right("Files Changed", Style::Title),
            Column::right("Net Lines", Style::Plain),
        ],
    );
    for c in &summary.contributors {
        let net = c.net_lines();
        table.push_styled_row(vec![
            Span::new(c.name.clone(), Style::Label),
            Span::new(c.commit_count.to_string(), Style::Metric),
            Span::new(format!("+{}", c.lines_added), Style::Positive),
            Span::new(format!("-{}", c.lines_removed), Style::Negative),
            Span::new(c.files_changed.to_string(), Style::Title),
            Span::new(
                format!("{net:+}"),
                if net >= 0 { Style::Positive } else { Style::Negative },
            ),
        ]);
    }
    if summary.unattributed.commits > 0 {
        let u = &summary.unattributed;
        let net = u.lines_added as i64 - u.lines_removed as i64;
        table.push_styled_row(vec![
            Span::new("(unattributed)", Style::Muted),
            Span::new(u.commits.to_string(), Style::Muted),
            Span::new(format!("+{}", u.lines_added), Style::Muted),
            Span::new(format!("-{}", u.lines_removed), Style::Muted),
            Span::new("", Style::Muted),
            Span::new(format!("{net:+}"), Style::Muted),
        ]);
    }
    table
}

fn commit_table(history: &History) -> Table {
    let mut table = Table::new(
        format!("Recent Commits (Last {COMMIT_TABLE_ROWS})"),
        vec![
            Column::left("Date", Style::Title),
            Column::left("Author", Style::Label),
            Column::left("Hash", Style::Metric),
            Column::left("Message", Style::Plain),
            Column::right("Changes", Style::Heading),
        ],
    );
    for commit in history.commits.iter().take(COMMIT_TABLE_ROWS) {
        let author = match commit.attribution() {
            Attribution::Attributed(name) => name.to_string(),
            Attribution::Unattributed => "(unattributed)".to_string(),
        };
        table.push_row([
            commit.timestamp.format("%Y-%m-%d").to_string(),
            author,
            commit.short_hash().to_string(),
            truncate(commit.subject(), MESSAGE_WIDTH),
            format!(
                "+{} -{} ({} files)",
                commit.lines_added(),
                commit.lines_removed(),
                commit.file_deltas.len()
            ),
        ]);
    }
    table
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}
