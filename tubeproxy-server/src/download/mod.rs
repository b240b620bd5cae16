//! Server side of a download: the tool's output as a byte stream.

mod errors;
pub mod models;
mod streamer;

pub use errors::DownloadError;
pub use models::{DownloadRequest, MediaFormat, MediaKind};
pub use streamer::{DownloadStream, DownloadStreamer, StreamerConfig};

/// Makes a title safe to use as a file name on every platform.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_whitespace() => ' ',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c == ' ');
    let truncated: String = trimmed.chars().take(100).collect();
    if truncated.is_empty() {
        "download".to_string()
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_filename;

    #[test]
    fn replaces_reserved_characters() {
        assert_eq!(sanitize_filename("AC/DC: Back in Black?"), "AC_DC_ Back in Black_");
        assert_eq!(sanitize_filename("  lots   of\tspace  "), "lots of space");
    }

    #[test]
    fn never_returns_an_empty_name() {
        assert_eq!(sanitize_filename(""), "download");
        assert_eq!(sanitize_filename("..."), "download");
    }

    #[test]
    fn caps_length() {
        assert_eq!(sanitize_filename(&"a".repeat(300)).chars().count(), 100);
    }
}
