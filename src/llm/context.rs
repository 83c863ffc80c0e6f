//! Serializes repository data into prompt context text.

use std::path::Path;

use crate::data::analysis::{ProjectProfile, PROFILE_FILE_SAMPLE, PROFILE_TOP_EXTENSIONS};
use crate::data::cwe::CweEntry;
use crate::data::stats::ActivitySummary;
use crate::data::tree;
use crate::git::{Attribution, History, ReportRequest};
use crate::llm::prompts::{Placeholder, PromptValues};

/// Number of commits described in the progress context.
pub const RECENT_COMMITS: usize = 20;

/// Describes a history window and its aggregation for the progress prompt.
pub fn progress_context(
    history: &History,
    request: &ReportRequest,
    summary: &ActivitySummary,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Repository: {} (Branch: {})\n", history.repo_name, history.branch));
    out.push_str(&format!("Analysis Period: {}\n", request.time_window.label()));
    out.push_str(&format!("Filter: {}\n", request.filter_label()));
    out.push_str(&format!("Total Commits: {}\n", summary.total_commits));
    out.push_str(&format!(
        "Lines Changed: +{} -{} across {} files\n",
        summary.total_lines_added, summary.total_lines_removed, summary.total_files_changed
    ));
    if summary.unattributed.commits > 0 {
        out.push_str(&format!(
            "Unattributed Commits: {} (+{} -{})\n",
            summary.unattributed.commits,
            summary.unattributed.lines_added,
            summary.unattributed.lines_removed
        ));
    }

    out.push_str("\nContributors:\n");
    if summary.contributors.is_empty() {
        out.push_str("- none\n");
    }
    for c in &summary.contributors {
        out.push_str(&format!(
            "- {}: {} commits, +{} -{} lines, {} files\n",
            c.name, c.commit_count, c.lines_added, c.lines_removed, c.files_changed
        ));
    }

    if !summary.commit_kinds.is_empty() {
        let kinds: Vec<String> = summary
            .commit_kinds
            .iter()
            .map(|(kind, count)| format!("{} {count}", kind.as_str()))
            .collect();
        out.push_str(&format!("\nCommit Types: {}\n", kinds.join(", ")));
    }
    if !summary.weekdays.is_empty() {
        let days: Vec<String> = summary
            .weekdays
            .iter()
            .map(|(day, count)| format!("{day} {count}"))
            .collect();
        out.push_str(&format!("Activity by Weekday: {}\n", days.join(", ")));
    }
    if !summary.top_files.is_empty() {
        out.push_str("Most Changed Files:\n");
        for (file, count) in &summary.top_files {
            out.push_str(&format!("- {file} ({count} commits)\n"));
        }
    }

    out.push_str("\nRecent Commits:\n");
    for commit in history.commits.iter().take(RECENT_COMMITS) {
        let author = match commit.attribution() {
            Attribution::Attributed(name) => name,
            Attribution::Unattributed => "(unattributed)",
        };
        out.push_str(&format!(
            "- {} - {author} ({})\n",
            commit.timestamp.format("%Y-%m-%d %H:%M"),
            commit.short_hash()
        ));
        out.push_str(&format!("  {}\n", commit.subject()));
        out.push_str(&format!(
            "  +{} -{} lines, {} files\n",
            commit.lines_added(),
            commit.lines_removed(),
            commit.file_deltas.len()
        ));
        if let Some(patch) = &commit.patch_excerpt {
            out.push_str("  diff:\n");
            for line in patch.lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
    }

    out
}

/// Describes a project profile for the README prompt.
pub fn readme_context(profile: &ProjectProfile) -> String {
    let flag = |present: bool| if present { "yes" } else { "no" };
    let keys = &profile.key_files;
    let extensions: Vec<String> = profile
        .top_extensions(PROFILE_TOP_EXTENSIONS)
        .iter()
        .map(|(ext, count)| format!("{ext}: {count}"))
        .collect();

    let mut out = String::new();
    out.push_str("Repository Analysis:\n");
    out.push_str(&format!("Name: {}\n", profile.repo_name));
    out.push_str(&format!("Project Type: {}\n", profile.project_type));
    out.push_str(&format!(
        "Main Language: {}\n",
        profile.main_extension.as_deref().unwrap_or("none")
    ));
    out.push_str("\nRepository Structure:\n");
    out.push_str(&format!("- Total Files: {}\n", profile.files.len()));
    out.push_str(&format!("- File Extensions: {}\n", extensions.join(", ")));
    out.push_str("\nKey Files Present:\n");
    out.push_str(&format!("- Requirements/Dependencies: {}\n", flag(keys.dependencies)));
    out.push_str(&format!("- Package Configuration: {}\n", flag(keys.package_json)));
    out.push_str(&format!("- Docker Support: {}\n", flag(keys.dockerfile)));
    out.push_str(&format!("- Build System: {}\n", flag(keys.makefile)));
    out.push_str(&format!("- Existing README: {}\n", flag(keys.readme)));
    out.push_str(&format!("- License: {}\n", flag(keys.license)));
    out.push_str(&format!("- Tests: {}\n", flag(keys.tests)));
    out.push_str(&format!("- Documentation: {}\n", flag(keys.docs)));
    out.push_str("\nFiles in Repository:\n");
    for file in profile.files.iter().take(PROFILE_FILE_SAMPLE) {
        out.push_str(&format!("{file}\n"));
    }
    out
}

/// Concatenates `files` inside `dir` as `File: name` sections.
pub fn directory_contents(dir: &Path, files: &[String]) -> String {
    let mut out = String::new();
    for file in files {
        out.push_str(&format!(
            "\n\nFile: {file}\n{}",
            tree::read_file_note(&dir.join(file))
        ));
    }
    out
}

/// Values for the per-directory summary prompt.
pub fn details_values(display_path: &str, contents: String) -> PromptValues {
    PromptValues::new()
        .with(Placeholder::Path, display_path)
        .with(Placeholder::FileContents, contents)
}

/// Concatenates file contents for the file-scan prompt.
pub fn code_samples(paths: &[impl AsRef<Path>]) -> String {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            format!("File: {}\n{}", path.display(), tree::read_file_note(path))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Values for the remediation-tip prompt.
pub fn remediation_values(cwe_id: &str, entry: Option<&CweEntry>) -> PromptValues {
    let values = PromptValues::new().with(Placeholder::CweId, cwe_id);
    match entry {
        Some(entry) => values
            .with(Placeholder::CweTitle, entry.title.clone())
            .with(Placeholder::CweDescription, entry.description.clone()),
        None => values,
    }
}
