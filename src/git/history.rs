//! Commit log walking within a time window.

use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use git2::{Oid, Signature, Sort};
use tracing::{debug, info, warn};

use super::{Commit, GitRepository};
use crate::error::ReportError;

/// Branches tried, in order, when no branch is requested.
pub const DEFAULT_BRANCHES: [&str; 2] = ["main", "master"];

/// How far back to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Only commits newer than the given number of days.
    LastDays(u32),
    /// Every commit.
    AllTime,
}

impl TimeWindow {
    /// Interprets a `--days` value; `0` means all time.
    pub const fn from_days(days: u32) -> Self {
        if days == 0 {
            Self::AllTime
        } else {
            Self::LastDays(days)
        }
    }

    /// Earliest timestamp inside the window, relative to `now`.
    ///
    /// A window reaching past the representable date range is all time.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::LastDays(days) => TimeDelta::try_days(i64::from(*days))
                .and_then(|span| now.checked_sub_signed(span)),
            Self::AllTime => None,
        }
    }

    /// Human-readable period label.
    pub fn label(&self) -> String {
        match self {
            Self::LastDays(days) => format!("Last {days} days"),
            Self::AllTime => "All time".to_string(),
        }
    }
}

/// Input parameters for one report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Time window to analyse.
    pub time_window: TimeWindow,
    /// Author names or emails to keep; empty keeps everyone.
    pub authors: Vec<String>,
    /// Branch to walk; `None` tries the default branches.
    pub branch: Option<String>,
    /// Whether merge commits are kept (they carry no file deltas).
    pub include_merges: bool,
}

impl ReportRequest {
    /// Creates a request for the given window with no filters.
    pub fn new(time_window: TimeWindow) -> Self {
        Self {
            time_window,
            authors: Vec::new(),
            branch: None,
            include_merges: false,
        }
    }

    /// Label describing the author filter.
    pub fn filter_label(&self) -> String {
        if self.authors.is_empty() {
            "All contributors".to_string()
        } else {
            self.authors.join(", ")
        }
    }

    /// Whether a commit signature passes the author filter.
    pub fn matches_author(&self, signature: &Signature<'_>) -> bool {
        if self.authors.is_empty() {
            return true;
        }
        let Some(name) = signature.name() else {
            return false;
        };
        let email = signature.email().unwrap_or("");
        self.authors
            .iter()
            .any(|wanted| wanted == name || wanted == email)
    }
}

/// Result of reading the history.
#[derive(Debug, Clone)]
pub struct History {
    /// Repository directory name.
    pub repo_name: String,
    /// Branch the commits were read from.
    pub branch: String,
    /// Commits in the window that passed the filters, newest first.
    pub commits: Vec<Commit>,
    /// Commits in the window before the author filter was applied.
    pub commits_in_window: usize,
}

/// Reads commits from a repository.
pub struct HistoryReader<'a> {
    repo: &'a GitRepository,
    now: DateTime<Utc>,
}

impl<'a> HistoryReader<'a> {
    /// Creates a reader using the current time as the window end.
    pub fn new(repo: &'a GitRepository) -> Self {
        Self::with_now(repo, Utc::now())
    }

    /// Creates a reader with a fixed window end.
    pub fn with_now(repo: &'a GitRepository, now: DateTime<Utc>) -> Self {
        Self { repo, now }
    }

    /// Reads the commits selected by `request`.
    ///
    /// Fails with [`ReportError::HistoryUnavailable`] if the requested branch
    /// does not exist or the window contains no commits at all.
    pub fn read(&self, request: &ReportRequest) -> Result<History> {
        let since = request.time_window.since(self.now);
        let (branch, in_window) = self.select_commits(request, since)?;

        if in_window.is_empty() {
            return Err(ReportError::HistoryUnavailable(format!(
                "no commits on {branch} for period: {}",
                request.time_window.label()
            ))
            .into());
        }

        let commits_in_window = in_window.len();
        let mut commits = Vec::with_capacity(in_window.len());
        for oid in in_window {
            let git_commit = self
                .repo
                .repository()
                .find_commit(oid)
                .context("Failed to find commit")?;
            if request.matches_author(&git_commit.author()) {
                commits.push(Commit::from_git_commit(self.repo.repository(), &git_commit)?);
            }
        }

        if commits.is_empty() {
            warn!(
                filter = %request.filter_label(),
                commits_in_window,
                "Author filter matched no commits"
            );
        }

        info!(
            branch = %branch,
            commits = commits.len(),
            commits_in_window,
            "Read git history"
        );

        Ok(History {
            repo_name: self.repo.name(),
            branch,
            commits,
            commits_in_window,
        })
    }

    fn select_commits(
        &self,
        request: &ReportRequest,
        since: Option<DateTime<Utc>>,
    ) -> Result<(String, Vec<Oid>)> {
        if let Some(branch) = &request.branch {
            let tip = self.repo.resolve_branch(branch).ok_or_else(|| {
                ReportError::HistoryUnavailable(format!("branch '{branch}' not found"))
            })?;
            let oids = self.walk(&[tip], since, request.include_merges)?;
            return Ok((branch.clone(), oids));
        }

        for candidate in DEFAULT_BRANCHES {
            if let Some(tip) = self.repo.resolve_branch(candidate) {
                let oids = self.walk(&[tip], since, request.include_merges)?;
                if !oids.is_empty() {
                    return Ok((candidate.to_string(), oids));
                }
                debug!(branch = candidate, "No commits in window, trying next branch");
            }
        }

        let tips = self.repo.local_branch_tips()?;
        let oids = self.walk(&tips, since, request.include_merges)?;
        Ok(("all branches".to_string(), oids))
    }

    fn walk(
        &self,
        tips: &[Oid],
        since: Option<DateTime<Utc>>,
        include_merges: bool,
    ) -> Result<Vec<Oid>> {
        let repo = self.repo.repository();
        let mut walker = repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TIME)
            .context("Failed to set revwalk sorting")?;
        for tip in tips {
            walker.push(*tip).context("Failed to push branch tip")?;
        }

        let mut seen = HashSet::new();
        let mut oids = Vec::new();
        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            if !seen.insert(oid) {
                continue;
            }
            let commit = repo.find_commit(oid).context("Failed to find commit")?;

            if let Some(since) = since {
                if commit.time().seconds() < since.timestamp() {
                    continue;
                }
            }
            if !include_merges && commit.parent_count() > 1 {
                continue;
            }
            oids.push(oid);
        }

        Ok(oids)
    }
}
