//! Git history access.

pub mod commit;
pub mod history;
pub mod repository;

pub use commit::{Attribution, Author, Commit, FileDelta};
pub use history::{History, HistoryReader, ReportRequest, TimeWindow};
pub use repository::GitRepository;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;
