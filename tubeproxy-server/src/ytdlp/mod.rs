//! Wrapper around the yt-dlp command-line tool.

pub mod args;
mod errors;
pub mod models;
pub mod path;
mod tool;

pub use errors::ToolError;
pub use models::{FormatInfo, VideoDump};
pub use path::resolve_tool_path;
pub use tool::YtDlp;
pub(crate) use tool::truncate_stderr;
