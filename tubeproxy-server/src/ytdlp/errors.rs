use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Every way a single-shot tool invocation can fail.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("yt-dlp not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to start yt-dlp at {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("yt-dlp did not finish within {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("yt-dlp failed with {status}: {stderr}")]
    ExitStatus { status: ExitStatus, stderr: String },

    #[error("yt-dlp produced no output")]
    EmptyOutput,

    #[error("could not parse yt-dlp output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error talking to yt-dlp: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub(crate) fn from_spawn(path: PathBuf, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound { path }
        } else {
            ToolError::Spawn { path, source: err }
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFound { .. } => "not_found",
            ToolError::Spawn { .. } => "spawn",
            ToolError::Timeout(_) => "timeout",
            ToolError::ExitStatus { .. } => "exit_status",
            ToolError::EmptyOutput => "empty_output",
            ToolError::Parse(_) => "parse",
            ToolError::Io(_) => "io",
        }
    }
}
