//! # reportr
//!
//! Reads git history and file trees, asks a completion API to write about
//! them, and renders the result to the terminal: progress reports, READMEs,
//! repository summaries and security-scan digests.
//!
//! ## Quick Start
//!
//! ```rust
//! use reportr::data::stats::aggregate;
//!
//! let summary = aggregate(&[]);
//! assert_eq!(summary.total_commits, 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod data;
pub mod error;
pub mod git;
pub mod llm;
pub mod render;
pub mod utils;

pub use crate::cli::Cli;
pub use crate::error::ReportError;

/// The current version of reportr.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
