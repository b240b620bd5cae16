use std::process::Command;

/// Exposes `BUILD_ID` to the crate: `TUBEPROXY_BUILD_ID` when set (release
/// tarballs have no git metadata), else the short commit hash.
fn main() {
    println!("cargo:rerun-if-env-changed=TUBEPROXY_BUILD_ID");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/heads/");

    let build_id = std::env::var("TUBEPROXY_BUILD_ID")
        .ok()
        .filter(|id| !id.trim().is_empty())
        .or_else(git_short_hash)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=BUILD_ID={}", build_id.trim());
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|hash| hash.trim().to_string())
}
