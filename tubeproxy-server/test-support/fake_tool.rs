// Fake yt-dlp executables shared by the unit tests (`src/testing.rs`) and the
// end-to-end tests (`tests/common/fixtures.rs`), both of which `include!` it.
//
// Each fake is a small shell script in its own temporary directory. Every
// invocation appends its arguments to `args.log`; long-running fakes write
// their pid to `tool.pid` so tests can check the process is gone afterwards.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Video the fake tool knows about.
pub const VIDEO_ID: &str = "abc123def45";

/// Title the fake tool reports for `VIDEO_ID`.
pub const VIDEO_TITLE: &str = "Cats Compilation";

/// Search results the fake prints for any `ytsearch` query.
pub const SEARCH_DUMP: &str = r#"{"id": "ytsearch", "entries": [
  {"id": "abc123def45", "title": "Cats Compilation", "duration": 125, "uploader": "Cat Channel", "view_count": 1000, "upload_date": "20240101"},
  {"id": "zyx987wvu65", "title": "More Cats", "duration": 3725.0, "channel": "Feline TV"}
]}"#;

/// Metadata dump the fake prints for a single video.
pub const VIDEO_DUMP: &str = r#"{"id": "abc123def45", "title": "Cats Compilation", "duration": 125, "uploader": "Cat Channel", "view_count": 1000, "formats": [
  {"format_id": "140", "ext": "m4a", "acodec": "mp4a.40.2", "vcodec": "none", "format_note": "medium"},
  {"format_id": "137", "ext": "mp4", "height": 1080, "acodec": "none", "vcodec": "avc1"},
  {"format_id": "18", "ext": "mp4", "resolution": "640x360", "acodec": "mp4a.40.2", "vcodec": "avc1.42001E", "format_note": "360p"}
]}"#;

/// Number of `chunk-NNN|` records the healthy fake writes for a download.
pub const PAYLOAD_CHUNKS: usize = 500;

/// The exact bytes the healthy fake writes for a download.
pub fn expected_payload() -> Vec<u8> {
    (0..PAYLOAD_CHUNKS)
        .map(|i| format!("chunk-{:03}|", i))
        .collect::<String>()
        .into_bytes()
}

pub struct FakeTool {
    _dir: TempDir,
    path: PathBuf,
    args_log: PathBuf,
    pid_file: PathBuf,
}

impl FakeTool {
    /// Answers `--version`, searches, metadata dumps and downloads.
    pub fn healthy() -> Self {
        Self::with_body(&format!(
            r#"MODE=metadata
for arg in "$@"; do
  case "$arg" in
    --version) echo "2024.08.06"; exit 0 ;;
    ytsearch*) MODE=search ;;
    --output) MODE=download ;;
  esac
done
case "$MODE" in
  search)
    cat <<'JSON'
{search}
JSON
    ;;
  download)
    i=0
    while [ $i -lt {chunks} ]; do printf 'chunk-%03d|' "$i"; i=$((i+1)); done
    ;;
  *)
    cat <<'JSON'
{video}
JSON
    ;;
esac"#,
            search = SEARCH_DUMP,
            video = VIDEO_DUMP,
            chunks = PAYLOAD_CHUNKS,
        ))
    }

    /// Fails every invocation, including `--version`.
    pub fn failing() -> Self {
        Self::with_body("echo 'ERROR: simulated failure' >&2\nexit 1")
    }

    pub fn garbage() -> Self {
        Self::with_body("echo 'this is not json'")
    }

    pub fn silent() -> Self {
        Self::with_body("exit 0")
    }

    pub fn hanging() -> Self {
        Self::with_body("echo $$ > \"__PIDFILE__\"\nexec sleep 30")
    }

    /// Rejects every format selector the way yt-dlp does.
    pub fn format_unavailable() -> Self {
        Self::with_body(
            "echo 'ERROR: [youtube] abc123def45: Requested format is not available. Use --list-formats' >&2\nexit 1",
        )
    }

    /// Writes forever once started.
    pub fn endless() -> Self {
        Self::with_body(
            "echo $$ > \"__PIDFILE__\"\nwhile true; do printf 'xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx'; done",
        )
    }

    /// One chunk, then silence with stdout still open.
    pub fn stalls_after_first_chunk() -> Self {
        Self::with_body("echo $$ > \"__PIDFILE__\"\nprintf 'first'\nexec sleep 30")
    }

    /// One chunk, then closes stdout but keeps running.
    pub fn closes_output_and_lingers() -> Self {
        Self::with_body("echo $$ > \"__PIDFILE__\"\nprintf 'all of it'\nexec >&-\nexec sleep 30")
    }

    pub fn fails_after_bytes() -> Self {
        Self::with_body("printf 'partial'\necho 'ERROR: connection reset' >&2\nexit 3")
    }

    fn with_body(body: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("yt-dlp");
        let args_log = dir.path().join("args.log");
        let pid_file = dir.path().join("tool.pid");
        let script = format!(
            "#!/bin/sh\necho \"$*\" >> \"{}\"\n{}\n",
            args_log.to_string_lossy(),
            body.replace("__PIDFILE__", &pid_file.to_string_lossy())
        );
        std::fs::write(&path, script).expect("Failed to write fake tool");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod fake tool");
        wait_until_executable(&path);
        let _ = std::fs::remove_file(&args_log);
        let _ = std::fs::remove_file(&pid_file);
        Self {
            _dir: dir,
            path,
            args_log,
            pid_file,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Argument lines of every invocation so far, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(&self.args_log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn search_calls(&self) -> usize {
        self.invocations()
            .iter()
            .filter(|line| line.contains("ytsearch"))
            .count()
    }

    /// Waits for the script to record its pid.
    pub async fn pid(&self) -> u32 {
        for _ in 0..500 {
            if let Ok(text) = std::fs::read_to_string(&self.pid_file) {
                if let Ok(pid) = text.trim().parse() {
                    return pid;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("fake tool never wrote its pid");
    }
}

/// A freshly written script can briefly fail with ETXTBSY while another
/// test thread forks; retry until it can be spawned.
fn wait_until_executable(path: &Path) {
    const ETXTBSY: i32 = 26;
    for _ in 0..100 {
        match std::process::Command::new(path)
            .arg("--version")
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
        {
            Ok(mut child) => {
                let _ = child.kill();
                let _ = child.wait();
                return;
            }
            Err(err) if err.raw_os_error() == Some(ETXTBSY) => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(err) => panic!("fake tool is not executable: {}", err),
        }
    }
    panic!("fake tool stayed busy");
}

/// True while a process with this pid exists and is not a zombie.
pub fn process_alive(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => !stat
            .rsplit_once(')')
            .map(|(_, rest)| rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false),
    }
}
