//! Streams the tool's stdout as a download body.
//!
//! `start` resolves only once the first byte is available, so spawn errors,
//! bad formats and stalled extractions surface as a typed error before any
//! response header is sent. After that a pump task forwards chunks through a
//! bounded channel. The returned [`DownloadStream`] holds a drop guard on
//! the pump's cancellation token: dropping it (client disconnect) kills and
//! reaps the process.

use bytes::Bytes;
use futures::Stream;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use super::errors::DownloadError;
use super::models::DownloadRequest;
use crate::server::metrics;
use crate::ytdlp::args::download_args;
use crate::ytdlp::{truncate_stderr, YtDlp};

const CHUNK_SIZE: usize = 64 * 1024;
const MAX_STDERR_BYTES: usize = 16 * 1024;
const ERROR_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamerConfig {
    /// How long to wait for the first byte of output.
    pub first_byte_timeout: Duration,
    /// Hard ceiling on the whole download, first-byte wait included.
    pub max_duration: Duration,
    /// Chunks buffered between the pump and the consumer.
    pub buffered_chunks: usize,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            first_byte_timeout: Duration::from_secs(10),
            max_duration: Duration::from_secs(5 * 60),
            buffered_chunks: 8,
        }
    }
}

pub struct DownloadStreamer {
    tool: YtDlp,
    config: StreamerConfig,
}

/// Media bytes in the order the tool wrote them.
pub struct DownloadStream {
    first: Option<Bytes>,
    chunks: mpsc::Receiver<io::Result<Bytes>>,
    pid: Option<u32>,
    _cancel_on_drop: DropGuard,
}

impl DownloadStream {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

impl Stream for DownloadStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(first) = self.first.take() {
            return Poll::Ready(Some(Ok(first)));
        }
        self.chunks.poll_recv(cx)
    }
}

async fn kill_and_reap(child: &mut Child) {
    if let Err(err) = child.kill().await {
        debug!("Could not kill yt-dlp (pid {:?}): {}", child.id(), err);
    }
}

/// Drains stderr so the child never blocks on it, keeping only the tail.
async fn collect_stderr(mut stderr: ChildStderr) -> String {
    let mut tail: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stderr.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                tail.extend_from_slice(&buf[..n]);
                if tail.len() > MAX_STDERR_BYTES {
                    let excess = tail.len() - MAX_STDERR_BYTES;
                    tail.drain(..excess);
                }
            }
        }
    }
    truncate_stderr(&tail)
}

impl DownloadStreamer {
    pub fn new(tool: YtDlp, config: StreamerConfig) -> Self {
        Self { tool, config }
    }

    pub fn tool(&self) -> &YtDlp {
        &self.tool
    }

    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    pub async fn start(&self, request: &DownloadRequest) -> Result<DownloadStream, DownloadError> {
        let deadline = Instant::now() + self.config.max_duration;
        let args = download_args(&request.video_id, &request.format);

        let mut child = self
            .tool
            .command(&args)
            .spawn()
            .map_err(|source| DownloadError::Spawn {
                path: self.tool.path().to_path_buf(),
                source,
            })?;
        let pid = child.id();
        info!(
            "Started yt-dlp (pid {:?}) for {} ({:?})",
            pid, request.video_id, request.format
        );

        let (Some(mut stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            kill_and_reap(&mut child).await;
            return Err(DownloadError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "yt-dlp output pipes were not captured",
            )));
        };
        let stderr_task = tokio::spawn(collect_stderr(stderr));

        let first_byte_limit = self.config.first_byte_timeout.min(self.config.max_duration);
        let mut buf = vec![0u8; CHUNK_SIZE];
        let first = match tokio::time::timeout(first_byte_limit, stdout.read(&mut buf)).await {
            Ok(Ok(0)) => {
                let err = early_exit(child, stderr_task, first_byte_limit).await;
                warn!("yt-dlp for {} produced nothing: {}", request.video_id, err);
                metrics::record_download(err.kind());
                return Err(err);
            }
            Ok(Ok(n)) => Bytes::copy_from_slice(&buf[..n]),
            Ok(Err(err)) => {
                kill_and_reap(&mut child).await;
                stderr_task.abort();
                metrics::record_download("io");
                return Err(err.into());
            }
            Err(_) => {
                kill_and_reap(&mut child).await;
                stderr_task.abort();
                let err = if first_byte_limit < self.config.first_byte_timeout {
                    DownloadError::Timeout(self.config.max_duration)
                } else {
                    DownloadError::NoData(first_byte_limit)
                };
                warn!("yt-dlp for {} stalled: {}", request.video_id, err);
                metrics::record_download(err.kind());
                return Err(err);
            }
        };
        debug!("First {} bytes for {} arrived", first.len(), request.video_id);

        let (sender, chunks) = mpsc::channel(self.config.buffered_chunks.max(1));
        let cancel = CancellationToken::new();
        let pump = Pump {
            child,
            stdout,
            stderr_task,
            sender,
            cancel: cancel.clone(),
            deadline,
            max_duration: self.config.max_duration,
            label: request.video_id.clone(),
            sent: first.len() as u64,
        };
        tokio::spawn(pump.run());

        Ok(DownloadStream {
            first: Some(first),
            chunks,
            pid,
            _cancel_on_drop: cancel.drop_guard(),
        })
    }
}

/// stdout closed before any byte: find out how the process ended.
async fn early_exit(
    mut child: Child,
    stderr_task: JoinHandle<String>,
    limit: Duration,
) -> DownloadError {
    match tokio::time::timeout(limit, child.wait()).await {
        Ok(Ok(status)) if !status.success() => {
            let stderr = stderr_task.await.unwrap_or_default();
            DownloadError::from_early_exit(status, stderr)
        }
        Ok(Ok(_)) => DownloadError::NoData(limit),
        Ok(Err(err)) => DownloadError::Io(err),
        Err(_) => {
            kill_and_reap(&mut child).await;
            stderr_task.abort();
            DownloadError::NoData(limit)
        }
    }
}

enum PumpOutcome {
    Finished,
    Cancelled,
    TimedOut,
    ReadError(io::Error),
}

struct Pump {
    child: Child,
    stdout: ChildStdout,
    stderr_task: JoinHandle<String>,
    sender: mpsc::Sender<io::Result<Bytes>>,
    cancel: CancellationToken,
    deadline: Instant,
    max_duration: Duration,
    label: String,
    sent: u64,
}

impl Pump {
    async fn run(mut self) {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let ceiling = tokio::time::sleep_until(self.deadline);
        tokio::pin!(ceiling);

        let outcome = loop {
            let read = tokio::select! {
                _ = self.cancel.cancelled() => break PumpOutcome::Cancelled,
                _ = &mut ceiling => break PumpOutcome::TimedOut,
                read = self.stdout.read(&mut buf) => read,
            };
            let chunk = match read {
                Ok(0) => break PumpOutcome::Finished,
                Ok(n) => Bytes::copy_from_slice(&buf[..n]),
                Err(err) => break PumpOutcome::ReadError(err),
            };
            let len = chunk.len() as u64;
            tokio::select! {
                _ = self.cancel.cancelled() => break PumpOutcome::Cancelled,
                _ = &mut ceiling => break PumpOutcome::TimedOut,
                sent = self.sender.send(Ok(chunk)) => {
                    if sent.is_err() {
                        break PumpOutcome::Cancelled;
                    }
                }
            }
            self.sent += len;
        };

        metrics::record_download_bytes(self.sent);
        match outcome {
            PumpOutcome::Finished => self.finish().await,
            PumpOutcome::Cancelled => {
                kill_and_reap(&mut self.child).await;
                self.stderr_task.abort();
                info!(
                    "Download of {} cancelled by the client after {} bytes",
                    self.label, self.sent
                );
                metrics::record_download("cancelled");
            }
            PumpOutcome::TimedOut => {
                kill_and_reap(&mut self.child).await;
                self.stderr_task.abort();
                warn!(
                    "Download of {} exceeded {}s, killed after {} bytes",
                    self.label,
                    self.max_duration.as_secs(),
                    self.sent
                );
                metrics::record_download("timeout");
                let err = io::Error::new(
                    io::ErrorKind::TimedOut,
                    DownloadError::Timeout(self.max_duration).to_string(),
                );
                self.deliver_error(err).await;
            }
            PumpOutcome::ReadError(err) => {
                kill_and_reap(&mut self.child).await;
                self.stderr_task.abort();
                warn!("Reading yt-dlp output for {} failed: {}", self.label, err);
                metrics::record_download("io");
                self.deliver_error(err).await;
            }
        }
    }

    /// Output ended: the body ends normally whatever the exit status.
    async fn finish(mut self) {
        // End the body now; the exit status only feeds logs and metrics.
        drop(self.sender);
        match tokio::time::timeout_at(self.deadline, self.child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                info!("Download of {} completed, {} bytes", self.label, self.sent);
                metrics::record_download("completed");
            }
            Ok(Ok(status)) => {
                let stderr = (&mut self.stderr_task).await.unwrap_or_default();
                warn!(
                    "yt-dlp for {} exited with {} after {} bytes: {}",
                    self.label, status, self.sent, stderr
                );
                metrics::record_download("exit_status");
            }
            Ok(Err(err)) => {
                warn!("Could not reap yt-dlp for {}: {}", self.label, err);
                metrics::record_download("io");
            }
            Err(_) => {
                kill_and_reap(&mut self.child).await;
                warn!(
                    "yt-dlp for {} closed its output but kept running, killed",
                    self.label
                );
                metrics::record_download("timeout");
            }
        }
        self.stderr_task.abort();
    }

    async fn deliver_error(self, err: io::Error) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::timeout(ERROR_DELIVERY_TIMEOUT, self.sender.send(Err(err))) => {}
        }
    }
}
