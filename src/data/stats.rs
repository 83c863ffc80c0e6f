//! Per-contributor aggregation of commit history.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Serialize;

use crate::git::{Attribution, Commit};

/// Number of most frequently changed files kept in a summary.
pub const TOP_CHANGED_FILES: usize = 10;

/// Totals for one contributor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContributorStats {
    /// Author name.
    pub name: String,
    /// Number of commits.
    pub commit_count: usize,
    /// Lines added across all commits.
    pub lines_added: usize,
    /// Lines removed across all commits.
    pub lines_removed: usize,
    /// File changes across all commits (a file touched twice counts twice).
    pub files_changed: usize,
}

impl ContributorStats {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn add(&mut self, commit: &Commit) {
        self.commit_count += 1;
        self.lines_added += commit.lines_added();
        self.lines_removed += commit.lines_removed();
        self.files_changed += commit.file_deltas.len();
    }

    /// Lines added minus lines removed.
    pub fn net_lines(&self) -> i64 {
        self.lines_added as i64 - self.lines_removed as i64
    }
}

/// Totals for commits without an author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnattributedStats {
    /// Number of commits.
    pub commits: usize,
    /// Lines added.
    pub lines_added: usize,
    /// Lines removed.
    pub lines_removed: usize,
}

/// Coarse commit category derived from the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitKind {
    /// Bug fixes.
    Fix,
    /// New functionality.
    Feature,
    /// Restructuring.
    Refactor,
    /// Documentation.
    Docs,
    /// Anything else.
    Other,
}

impl CommitKind {
    /// Classifies a commit message by keyword.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has_any(&["fix", "bug", "issue", "error"]) {
            Self::Fix
        } else if has_any(&["feat", "add", "implement", "new"]) {
            Self::Feature
        } else if has_any(&["refactor", "clean", "restructure"]) {
            Self::Refactor
        } else if has_any(&["doc", "readme", "comment"]) {
            Self::Docs
        } else {
            Self::Other
        }
    }

    /// Lowercase label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fix => "fix",
            Self::Feature => "feature",
            Self::Refactor => "refactor",
            Self::Docs => "docs",
            Self::Other => "other",
        }
    }
}

/// Aggregated view of a commit sequence.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivitySummary {
    /// Contributors by descending commit count, ties by name.
    pub contributors: Vec<ContributorStats>,
    /// All commits in the sequence, attributed or not.
    pub total_commits: usize,
    /// Commits without an author.
    pub unattributed: UnattributedStats,
    /// Lines added across all commits.
    pub total_lines_added: usize,
    /// Lines removed across all commits.
    pub total_lines_removed: usize,
    /// File changes across all commits.
    pub total_files_changed: usize,
    /// Commits per category.
    pub commit_kinds: BTreeMap<CommitKind, usize>,
    /// Commits per weekday name (e.g. `"Monday"`).
    pub weekdays: BTreeMap<String, usize>,
    /// File changes per extension (e.g. `".rs"`).
    pub file_types: BTreeMap<String, usize>,
    /// Most frequently changed paths with their change counts.
    pub top_files: Vec<(String, usize)>,
}

impl ActivitySummary {
    /// Looks up a contributor by name.
    pub fn contributor(&self, name: &str) -> Option<&ContributorStats> {
        self.contributors.iter().find(|c| c.name == name)
    }

    /// Total lines added plus removed.
    pub fn total_lines_changed(&self) -> usize {
        self.total_lines_added + self.total_lines_removed
    }
}

/// Folds a commit sequence into an [`ActivitySummary`].
pub fn aggregate(commits: &[Commit]) -> ActivitySummary {
    let mut by_name: HashMap<&str, ContributorStats> = HashMap::new();
    let mut summary = ActivitySummary::default();
    let mut file_counts: HashMap<&str, usize> = HashMap::new();

    for commit in commits {
        summary.total_commits += 1;
        summary.total_lines_added += commit.lines_added();
        summary.total_lines_removed += commit.lines_removed();
        summary.total_files_changed += commit.file_deltas.len();

        match commit.attribution() {
            Attribution::Attributed(name) => {
                by_name
                    .entry(name)
                    .or_insert_with(|| ContributorStats::new(name))
                    .add(commit);
            }
            Attribution::Unattributed => {
                summary.unattributed.commits += 1;
                summary.unattributed.lines_added += commit.lines_added();
                summary.unattributed.lines_removed += commit.lines_removed();
            }
        }

        *summary
            .commit_kinds
            .entry(CommitKind::classify(&commit.message))
            .or_insert(0) += 1;
        *summary
            .weekdays
            .entry(commit.timestamp.format("%A").to_string())
            .or_insert(0) += 1;

        for path in commit.file_deltas.keys() {
            *file_counts.entry(path.as_str()).or_insert(0) += 1;
            if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
                *summary.file_types.entry(format!(".{ext}")).or_insert(0) += 1;
            }
        }
    }

    let mut contributors: Vec<ContributorStats> = by_name.into_values().collect();
    contributors.sort_by(|a, b| {
        b.commit_count
            .cmp(&a.commit_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    summary.contributors = contributors;

    let mut top_files: Vec<(String, usize)> = file_counts
        .into_iter()
        .map(|(path, count)| (path.to_string(), count))
        .collect();
    top_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_files.truncate(TOP_CHANGED_FILES);
    summary.top_files = top_files;

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{Author, FileDelta};
    use chrono::{FixedOffset, TimeZone};
    use proptest::prelude::*;

    fn commit(author: Option<&str>, deltas: &[(usize, usize)]) -> Commit {
        Commit {
            hash: "f".repeat(40),
            author: author.map(|name| Author {
                name: name.to_string(),
                email: String::new(),
            }),
            // 2024-05-06 is a Monday.
            timestamp: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 5, 6, 9, 30, 0)
                .unwrap(),
            message: "update".to_string(),
            file_deltas: deltas
                .iter()
                .enumerate()
                .map(|(i, (a, r))| (format!("src/file{i}.rs"), FileDelta::new(*a, *r)))
                .collect(),
            is_merge: false,
            patch_excerpt: None,
        }
    }

    #[test]
    fn empty_sequence_yields_zero_totals() {
        let summary = aggregate(&[]);
        assert!(summary.contributors.is_empty());
        assert_eq!(summary.total_commits, 0);
        assert_eq!(summary.total_lines_changed(), 0);
        assert_eq!(summary.unattributed, UnattributedStats::default());
    }

    #[test]
    fn contributor_totals_and_order() {
        let commits = vec![
            commit(Some("B"), &[(1, 1)]),
            commit(Some("A"), &[(10, 2)]),
            commit(Some("A"), &[(5, 0)]),
            commit(Some("A"), &[(0, 3)]),
        ];
        let summary = aggregate(&commits);

        let names: Vec<&str> = summary.contributors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);

        let a = summary.contributor("A").unwrap();
        assert_eq!((a.commit_count, a.lines_added, a.lines_removed), (3, 15, 5));
        let b = summary.contributor("B").unwrap();
        assert_eq!((b.commit_count, b.lines_added, b.lines_removed), (1, 1, 1));

        assert_eq!(summary.total_commits, 4);
        assert_eq!(summary.total_lines_added, 16);
        assert_eq!(summary.total_lines_removed, 6);
    }

    #[test]
    fn ties_break_by_name() {
        let commits = vec![
            commit(Some("zoe"), &[]),
            commit(Some("amy"), &[]),
            commit(Some("mo"), &[]),
        ];
        let names: Vec<String> = aggregate(&commits)
            .contributors
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["amy", "mo", "zoe"]);
    }

    #[test]
    fn commit_without_deltas_counts_but_adds_no_lines() {
        let mut merge = commit(Some("A"), &[]);
        merge.is_merge = true;
        let summary = aggregate(&[merge]);
        let a = summary.contributor("A").unwrap();
        assert_eq!(a.commit_count, 1);
        assert_eq!(a.lines_added + a.lines_removed, 0);
    }

    #[test]
    fn missing_author_goes_to_unattributed() {
        let commits = vec![commit(None, &[(4, 1)]), commit(Some("A"), &[(1, 0)])];
        let summary = aggregate(&commits);
        assert_eq!(summary.contributors.len(), 1);
        assert_eq!(summary.unattributed.commits, 1);
        assert_eq!(summary.unattributed.lines_added, 4);
        assert_eq!(summary.total_lines_added, 5);
    }

    #[test]
    fn histograms_are_filled() {
        let mut fix = commit(Some("A"), &[(1, 0)]);
        fix.message = "Fix crash on empty input".to_string();
        let summary = aggregate(&[fix, commit(Some("A"), &[(1, 0), (2, 0)])]);
        assert_eq!(summary.commit_kinds.get(&CommitKind::Fix), Some(&1));
        assert_eq!(summary.commit_kinds.get(&CommitKind::Other), Some(&1));
        assert_eq!(summary.weekdays.get("Monday"), Some(&2));
        assert_eq!(summary.file_types.get(".rs"), Some(&3));
        assert_eq!(summary.top_files[0], ("src/file0.rs".to_string(), 2));
    }

    #[test]
    fn classify_checks_categories_in_order() {
        assert_eq!(CommitKind::classify("Fix typo in docs"), CommitKind::Fix);
        assert_eq!(CommitKind::classify("Implement cache"), CommitKind::Feature);
        assert_eq!(CommitKind::classify("Clean up module"), CommitKind::Refactor);
        assert_eq!(CommitKind::classify("Update README"), CommitKind::Docs);
        assert_eq!(CommitKind::classify("Bump version"), CommitKind::Other);
    }

    fn arb_commit() -> impl Strategy<Value = Commit> {
        (
            prop::option::weighted(0.85, prop::sample::select(vec!["A", "B", "C", "D"])),
            prop::collection::vec((0usize..500, 0usize..500), 0..4),
        )
            .prop_map(|(author, deltas)| commit(author, &deltas))
    }

    proptest! {
        #[test]
        fn commit_counts_add_up(commits in prop::collection::vec(arb_commit(), 0..40)) {
            let summary = aggregate(&commits);
            let attributed: usize = summary.contributors.iter().map(|c| c.commit_count).sum();
            prop_assert_eq!(attributed, commits.len() - summary.unattributed.commits);
            prop_assert_eq!(summary.total_commits, commits.len());

            let added: usize = summary.contributors.iter().map(|c| c.lines_added).sum();
            prop_assert_eq!(added + summary.unattributed.lines_added, summary.total_lines_added);
        }

        #[test]
        fn contributors_are_ordered(commits in prop::collection::vec(arb_commit(), 0..40)) {
            let summary = aggregate(&commits);
            for pair in summary.contributors.windows(2) {
                let ordered = pair[0].commit_count > pair[1].commit_count
                    || (pair[0].commit_count == pair[1].commit_count && pair[0].name < pair[1].name);
                prop_assert!(ordered);
            }
        }
    }
}
