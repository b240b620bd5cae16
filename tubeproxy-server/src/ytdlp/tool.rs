use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::args::{metadata_args, search_args, version_args};
use super::errors::ToolError;
use super::models::{summaries_from_dump, SearchDump, VideoDump};
use crate::search::models::VideoSummary;

const MAX_STDERR_CHARS: usize = 2000;

/// Handle on the external extraction tool.
#[derive(Debug, Clone)]
pub struct YtDlp {
    path: PathBuf,
}

pub(crate) fn truncate_stderr(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    match text.char_indices().nth(MAX_STDERR_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

impl YtDlp {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// stdin is closed, stdout and stderr are piped, and the child is killed
    /// if its handle is dropped.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    pub fn spawn(&self, args: &[String]) -> Result<Child, ToolError> {
        self.command(args)
            .spawn()
            .map_err(|err| ToolError::from_spawn(self.path.clone(), err))
    }

    /// Runs the tool to completion and returns its stdout. The process is
    /// killed when `limit` elapses.
    pub async fn run(&self, args: &[String], limit: Duration) -> Result<Vec<u8>, ToolError> {
        debug!("Running {:?} {:?}", self.path, args);
        let child = self.spawn(args)?;
        let pid = child.id();

        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(
                    "yt-dlp (pid {:?}) exceeded {}s, killing it",
                    pid,
                    limit.as_secs()
                );
                return Err(ToolError::Timeout(limit));
            }
        };

        if !output.status.success() {
            return Err(ToolError::ExitStatus {
                status: output.status,
                stderr: truncate_stderr(&output.stderr),
            });
        }
        if output.stdout.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ToolError::EmptyOutput);
        }
        Ok(output.stdout)
    }

    pub async fn version(&self, limit: Duration) -> Result<String, ToolError> {
        let stdout = self.run(&version_args(), limit).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Single-shot flat search. An empty list is a valid answer here; the
    /// caller decides whether that counts as a miss.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        limit: Duration,
    ) -> Result<Vec<VideoSummary>, ToolError> {
        let stdout = self.run(&search_args(query, max_results), limit).await?;
        let dump: SearchDump = serde_json::from_slice(&stdout)?;
        Ok(summaries_from_dump(dump, max_results))
    }

    pub async fn video_metadata(
        &self,
        video_id: &str,
        limit: Duration,
    ) -> Result<VideoDump, ToolError> {
        let stdout = self.run(&metadata_args(video_id), limit).await?;
        let mut dump: VideoDump = serde_json::from_slice(&stdout)?;
        if dump.id.is_empty() {
            dump.id = video_id.to_string();
        }
        Ok(dump)
    }
}
