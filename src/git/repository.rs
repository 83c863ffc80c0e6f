//! Git repository operations.

use std::path::Path;

use anyhow::Result;
use git2::{BranchType, Oid, Repository};

use crate::error::ReportError;

/// Git repository wrapper.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Opens the repository rooted at `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReportError::InputNotFound(path.to_path_buf()).into());
        }

        let repo = Repository::open(path).map_err(|e| {
            ReportError::HistoryUnavailable(format!(
                "{} is not a git repository ({})",
                path.display(),
                e.message()
            ))
        })?;

        Ok(Self { repo })
    }

    /// Returns the underlying `git2::Repository`.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Returns the working directory name, or `"Unknown"` for bare repositories.
    pub fn name(&self) -> String {
        self.repo
            .workdir()
            .and_then(|dir| dir.file_name())
            .map_or_else(
                || "Unknown".to_string(),
                |name| name.to_string_lossy().into_owned(),
            )
    }

    /// Resolves a branch name or revspec to the commit it points at.
    ///
    /// Local branches are preferred, then remote branches, then any revspec.
    pub fn resolve_branch(&self, branch_name: &str) -> Option<Oid> {
        for kind in [BranchType::Local, BranchType::Remote] {
            if let Ok(branch) = self.repo.find_branch(branch_name, kind) {
                if let Ok(commit) = branch.get().peel_to_commit() {
                    return Some(commit.id());
                }
            }
        }

        self.repo
            .revparse_single(branch_name)
            .and_then(|obj| obj.peel_to_commit())
            .map(|commit| commit.id())
            .ok()
    }

    /// Returns the tips of all local branches.
    pub fn local_branch_tips(&self) -> Result<Vec<Oid>> {
        let mut tips = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(oid) = branch.get().target() {
                tips.push(oid);
            }
        }
        Ok(tips)
    }
}
