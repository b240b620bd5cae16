//! Fake yt-dlp executables
//!
//! The scripts are shared with the library's unit tests.

include!("../../test-support/fake_tool.rs");
