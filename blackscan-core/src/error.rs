//! Error types for the blackscan core library.

use std::process::ExitStatus;
use thiserror::Error;

/// Custom error types for blackscan
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] std::io::Error),

    #[error("{0} exited with status {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("Decode failed for {0}: {1}")]
    Decode(String, String),

    #[error("ffprobe parse error: {0}")]
    FfprobeParse(String),

    #[error("JSON error: {0}")]
    JsonParse(String),

    #[error("Invalid path: {0}")]
    PathError(String),

    #[error("No processable video files found")]
    NoFilesFound,
}

/// Result type for blackscan operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Creates a `CommandStart` error for a tool that failed to launch.
pub fn command_start_error(tool: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(tool.into(), err)
}

/// Creates a `CommandFailed` error for a tool that exited abnormally.
pub fn command_failed_error(
    tool: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(tool.into(), status, stderr.into())
}
