use std::path::{Path, PathBuf};

/// Name looked up on `PATH` when no other binary is found.
pub const SYSTEM_COMMAND: &str = "yt-dlp";

pub fn bundled_binary_name() -> &'static str {
    if cfg!(windows) {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    }
}

/// Picks the binary to run: an explicit path wins, then a bundled
/// `bin/yt-dlp` under `base_dir`, then whatever `yt-dlp` resolves to on
/// `PATH`.
pub fn resolve_tool_path(explicit: Option<&Path>, base_dir: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let bundled = base_dir.join("bin").join(bundled_binary_name());
    if bundled.is_file() {
        return bundled;
    }
    PathBuf::from(SYSTEM_COMMAND)
}
