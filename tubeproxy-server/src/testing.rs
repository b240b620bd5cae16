//! Fake yt-dlp executables for unit tests.

include!("../test-support/fake_tool.rs");
