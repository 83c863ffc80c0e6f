//! Data derived from a repository: activity statistics, file trees and scan digests.

pub mod analysis;
pub mod cwe;
pub mod scan;
pub mod stats;
pub mod tree;

pub use analysis::{ProjectProfile, ProjectType};
pub use scan::{CweInsights, ScanFinding, Severity};
pub use stats::{aggregate, ActivitySummary, CommitKind, ContributorStats};
pub use tree::{FileFilter, TreeNode, TreeSnapshot};
