use std::process::Command;

/// Expose `git describe` as CARGO_GIT_VERSION, e.g. `v0.2`, `034ac04` or `034ac04-dirty`.
///
/// Builds outside a git checkout fall back to the crate version in `main.rs`.
fn main() {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags"])
        .output();

    let Ok(output) = output else {
        eprintln!("git not available; using crate version");
        return;
    };
    if !output.status.success() {
        eprintln!("git describe failed; using crate version");
        return;
    }

    let version = String::from_utf8_lossy(&output.stdout);
    println!("cargo:rustc-env=CARGO_GIT_VERSION={}", version.trim());
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
}
