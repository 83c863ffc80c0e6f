//! Commit records read from the repository.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::{Diff, Patch, Repository};
use serde::Serialize;

/// Maximum number of patch characters kept per commit.
pub const MAX_PATCH_EXCERPT_CHARS: usize = 1_500;

/// Commit author identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    /// Display name as recorded in the commit.
    pub name: String,
    /// Email address as recorded in the commit.
    pub email: String,
}

/// Lines added and removed in a single file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileDelta {
    /// Lines added.
    pub added: usize,
    /// Lines removed.
    pub removed: usize,
}

impl FileDelta {
    /// Creates a delta.
    pub const fn new(added: usize, removed: usize) -> Self {
        Self { added, removed }
    }
}

/// One commit in the analysed window.
#[derive(Debug, Clone, Serialize)]
pub struct Commit {
    /// Full SHA-1 hash.
    pub hash: String,
    /// Author identity; `None` when the commit carries no usable name.
    pub author: Option<Author>,
    /// Commit time with the committer's offset.
    pub timestamp: DateTime<FixedOffset>,
    /// Full message, trimmed.
    pub message: String,
    /// Per-file line counts keyed by path.
    pub file_deltas: BTreeMap<String, FileDelta>,
    /// Whether the commit has more than one parent.
    pub is_merge: bool,
    /// Start of the textual patch, truncated to [`MAX_PATCH_EXCERPT_CHARS`].
    pub patch_excerpt: Option<String>,
}

/// Who a commit is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution<'a> {
    /// Commit has an author name.
    Attributed(&'a str),
    /// Commit has no author name.
    Unattributed,
}

impl Commit {
    /// Resolves the contributor this commit belongs to.
    pub fn attribution(&self) -> Attribution<'_> {
        match &self.author {
            Some(author) if !author.name.trim().is_empty() => {
                Attribution::Attributed(author.name.as_str())
            }
            _ => Attribution::Unattributed,
        }
    }

    /// Sum of added lines across all files.
    pub fn lines_added(&self) -> usize {
        self.file_deltas.values().map(|d| d.added).sum()
    }

    /// Sum of removed lines across all files.
    pub fn lines_removed(&self) -> usize {
        self.file_deltas.values().map(|d| d.removed).sum()
    }

    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Abbreviated hash.
    pub fn short_hash(&self) -> &str {
        let len = super::SHORT_HASH_LEN;
        if self.hash.len() > len {
            &self.hash[..len]
        } else {
            &self.hash
        }
    }

    /// Reads a commit and its per-file deltas.
    ///
    /// Non-merge commits are diffed against their first parent (or the empty
    /// tree for a root commit). Merge commits carry no deltas.
    pub fn from_git_commit(repo: &Repository, commit: &git2::Commit<'_>) -> Result<Self> {
        let hash = commit.id().to_string();
        let signature = commit.author();
        let author = signature.name().map(|name| Author {
            name: name.to_string(),
            email: signature.email().unwrap_or("").to_string(),
        });

        let when = commit.time();
        let offset = FixedOffset::east_opt(when.offset_minutes() * 60)
            .or_else(|| FixedOffset::east_opt(0))
            .context("Invalid commit timezone offset")?;
        let timestamp = DateTime::from_timestamp(when.seconds(), 0)
            .context("Invalid commit timestamp")?
            .with_timezone(&offset);

        let message = commit.message().unwrap_or("").trim().to_string();
        let is_merge = commit.parent_count() > 1;

        let (file_deltas, patch_excerpt) = if is_merge {
            (BTreeMap::new(), None)
        } else {
            let diff = first_parent_diff(repo, commit)?;
            (collect_file_deltas(&diff)?, patch_excerpt(&diff)?)
        };

        Ok(Self {
            hash,
            author,
            timestamp,
            message,
            file_deltas,
            is_merge,
            patch_excerpt,
        })
    }
}

fn first_parent_diff<'r>(repo: &'r Repository, commit: &git2::Commit<'_>) -> Result<Diff<'r>> {
    let commit_tree = commit.tree().context("Failed to get commit tree")?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(
            commit
                .parent(0)
                .context("Failed to get parent commit")?
                .tree()
                .context("Failed to get parent tree")?,
        )
    } else {
        None
    };

    repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)
        .context("Failed to create diff")
}

fn collect_file_deltas(diff: &Diff<'_>) -> Result<BTreeMap<String, FileDelta>> {
    let mut deltas = BTreeMap::new();

    for idx in 0..diff.deltas().count() {
        let Some(delta) = diff.get_delta(idx) else {
            continue;
        };
        let Some(path) = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .and_then(|p| p.to_str())
        else {
            continue;
        };

        let (added, removed) = match Patch::from_diff(diff, idx).context("Failed to read patch")? {
            Some(patch) => {
                let (_context, additions, deletions) =
                    patch.line_stats().context("Failed to count patch lines")?;
                (additions, deletions)
            }
            // Binary files have no textual patch.
            None => (0, 0),
        };

        let entry: &mut FileDelta = deltas.entry(path.to_string()).or_default();
        entry.added += added;
        entry.removed += removed;
    }

    Ok(deltas)
}

fn patch_excerpt(diff: &Diff<'_>) -> Result<Option<String>> {
    let mut excerpt = String::new();
    let mut truncated = false;

    diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
        let prefix = match line.origin() {
            c @ ('+' | '-' | ' ') => Some(c),
            _ => None,
        };
        let content = String::from_utf8_lossy(line.content());
        let remaining = MAX_PATCH_EXCERPT_CHARS.saturating_sub(excerpt.chars().count());
        if remaining == 0 {
            truncated = true;
            return false;
        }

        let mut piece = String::new();
        if let Some(c) = prefix {
            piece.push(c);
        }
        piece.push_str(&content);

        if piece.chars().count() > remaining {
            excerpt.extend(piece.chars().take(remaining));
            truncated = true;
            return false;
        }
        excerpt.push_str(&piece);
        true
    })
    .or_else(|e| {
        // Returning false from the callback aborts the print with a user error.
        if truncated {
            Ok(())
        } else {
            Err(e)
        }
    })
    .context("Failed to format diff")?;

    if excerpt.is_empty() {
        return Ok(None);
    }
    if truncated {
        excerpt.push_str("\n... (truncated)");
    }
    Ok(Some(excerpt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn commit(author: Option<&str>, deltas: &[(&str, usize, usize)]) -> Commit {
        Commit {
            hash: "0123456789abcdef0123456789abcdef01234567".to_string(),
            author: author.map(|name| Author {
                name: name.to_string(),
                email: format!("{name}@example.com"),
            }),
            timestamp: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 5, 6, 12, 0, 0)
                .unwrap(),
            message: "Add parser\n\nLonger body".to_string(),
            file_deltas: deltas
                .iter()
                .map(|(path, a, r)| ((*path).to_string(), FileDelta::new(*a, *r)))
                .collect(),
            is_merge: false,
            patch_excerpt: None,
        }
    }

    #[test]
    fn attribution_uses_author_name() {
        let c = commit(Some("Ada"), &[]);
        assert_eq!(c.attribution(), Attribution::Attributed("Ada"));
    }

    #[test]
    fn blank_or_missing_author_is_unattributed() {
        assert_eq!(commit(None, &[]).attribution(), Attribution::Unattributed);
        assert_eq!(
            commit(Some("   "), &[]).attribution(),
            Attribution::Unattributed
        );
    }

    #[test]
    fn line_sums_cover_all_files() {
        let c = commit(Some("Ada"), &[("a.rs", 10, 2), ("b.rs", 5, 1)]);
        assert_eq!(c.lines_added(), 15);
        assert_eq!(c.lines_removed(), 3);
    }

    #[test]
    fn subject_and_short_hash() {
        let c = commit(Some("Ada"), &[]);
        assert_eq!(c.subject(), "Add parser");
        assert_eq!(c.short_hash(), "01234567");
    }
}
