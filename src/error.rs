//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the wallstash CLI.
///
/// - 0: Success
/// - 1: General error (nothing was done, or an unexpected failure)
/// - 3: Partial failure (some downloads failed, others succeeded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: every requested operation completed.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// Partial failure: some items failed while others succeeded.
    PartialFailure = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "WS000",
            Self::GeneralError => "WS001",
            Self::PartialFailure => "WS003",
        }
    }

    /// Exit code for a batch with `failed` failures out of `total` items.
    #[must_use]
    pub fn for_batch(total: usize, failed: usize) -> Self {
        if failed == 0 {
            Self::Success
        } else if failed < total {
            Self::PartialFailure
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "WS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
