use std::process::Command;

fn main() {
    // QUADCAST_RGB_VERSION: tagged release builds export the git tag minus its
    // leading `v`. Untagged and local builds use the Cargo.toml version.
    let version = std::env::var("QUADCAST_RGB_VERSION")
        .unwrap_or_else(|_| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());
    println!("cargo:rustc-env=QUADCAST_RGB_VERSION={version}");

    // QUADCAST_RGB_COMMIT: shown next to the version in the window footer.
    // Falls back to `git rev-parse --short HEAD`.
    let commit = std::env::var("QUADCAST_RGB_COMMIT").unwrap_or_else(|_| {
        let output = Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output();
        match output {
            Ok(o) if o.status.success() => {
                String::from_utf8_lossy(&o.stdout).trim().to_string()
            }
            _ => "unknown".to_string(),
        }
    });
    println!("cargo:rustc-env=QUADCAST_RGB_COMMIT={commit}");

    println!("cargo:rerun-if-env-changed=QUADCAST_RGB_VERSION");
    println!("cargo:rerun-if-env-changed=QUADCAST_RGB_COMMIT");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}
