//! User-facing error kinds.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced directly to the user as a terminal message.
///
/// Internal plumbing uses `anyhow::Result`; these kinds are attached at the
/// boundary where the failure is classified and recovered again in `main`
/// (via `downcast_ref`) to pick the process exit code.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A path given on the command line does not exist or cannot be read.
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The path is not a git repository or the requested history is empty.
    #[error("Git history unavailable: {0}")]
    HistoryUnavailable(String),

    /// The completion API call failed (timeout, authentication, HTTP or shape).
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A scan-result input file is not valid JSON of the expected shape.
    #[error("Malformed scan input {}: {reason}", .path.display())]
    MalformedScanInput {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The directory is too large to send to the model.
    #[error("{0}. Consider excluding large directories or files")]
    SizeLimitExceeded(String),
}

impl ReportError {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputNotFound(_) => 2,
            Self::HistoryUnavailable(_) => 3,
            Self::GenerationFailed(_) => 4,
            Self::MalformedScanInput { .. } => 5,
            Self::SizeLimitExceeded(_) => 6,
        }
    }
}

/// Returns the exit code for an arbitrary error, defaulting to 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ReportError>())
        .map_or(1, ReportError::exit_code)
}
