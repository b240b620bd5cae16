use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

const FORMAT_UNAVAILABLE_MARKERS: [&str; 2] =
    ["requested format is not available", "no video formats found"];

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to start yt-dlp at {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No data received from yt-dlp within {} seconds", .0.as_secs())]
    NoData(Duration),

    #[error("Requested format is not available: {0}")]
    FormatUnavailable(String),

    #[error("yt-dlp failed with {status}: {stderr}")]
    ExitStatus { status: ExitStatus, stderr: String },

    #[error("Download timeout after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("I/O error while reading from yt-dlp: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Classifies an exit that happened before any byte was produced.
    pub(crate) fn from_early_exit(status: ExitStatus, stderr: String) -> Self {
        let lowered = stderr.to_lowercase();
        if FORMAT_UNAVAILABLE_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
        {
            DownloadError::FormatUnavailable(stderr)
        } else {
            DownloadError::ExitStatus { status, stderr }
        }
    }

    /// Headline shown to the user.
    pub fn summary(&self) -> &'static str {
        match self {
            DownloadError::Timeout(_) | DownloadError::NoData(_) => "Download timeout",
            DownloadError::FormatUnavailable(_) => "Video format not available",
            _ => "Download failed",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            DownloadError::Spawn { .. } => {
                "Make sure yt-dlp is installed (pip install yt-dlp) or set YTDLP_PATH"
            }
            DownloadError::Timeout(_) => {
                "The video is too long or the connection is slow. Try a shorter video or a lower quality"
            }
            DownloadError::NoData(_) => {
                "yt-dlp did not start sending data. Check that it is up to date and try again"
            }
            DownloadError::FormatUnavailable(_) => "Try a different quality setting",
            DownloadError::ExitStatus { .. } | DownloadError::Io(_) => {
                "Check that the video is available and try again"
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DownloadError::Spawn { .. } => "spawn",
            DownloadError::NoData(_) => "no_data",
            DownloadError::FormatUnavailable(_) => "format_unavailable",
            DownloadError::ExitStatus { .. } => "exit_status",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Io(_) => "io",
        }
    }
}
