//! tubeproxy server library
//!
//! Searches YouTube through a chain of fallbacks and streams downloads
//! produced by yt-dlp. This library exposes the internal modules for the
//! binaries and the end-to-end tests.

pub mod client;
pub mod config;
pub mod download;
pub mod progress;
pub mod rate_limit;
pub mod search;
pub mod server;
pub mod youtube;
pub mod ytdlp;

#[cfg(all(test, unix))]
#[allow(dead_code)]
mod testing;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerState};
