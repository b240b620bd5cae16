//! Client-side progress accounting for streamed downloads.

mod format;
mod item;
mod session;
mod tracker;

pub use format::{format_bytes, format_eta, format_speed};
pub use item::{DownloadItem, DownloadQueue, DownloadStatus, TransitionError};
pub use session::{
    control_channel, track_download, ControlReceiver, ControlSignal, DownloadControl,
    TrackedOutcome,
};
pub(crate) use session::record_failure;
pub use tracker::{ProgressSnapshot, ProgressTracker, UPDATE_INTERVAL};
