use std::process::Command;

fn main() {
    for (var, key) in [
        ("TARGET", "MINDLINK_BUILD_TARGET"),
        ("PROFILE", "MINDLINK_BUILD_PROFILE"),
    ] {
        if let Ok(value) = std::env::var(var) {
            println!("cargo:rustc-env={key}={value}");
        }
        println!("cargo:rerun-if-env-changed={var}");
    }

    let git_hash = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty());
    if let Some(hash) = git_hash {
        println!("cargo:rustc-env=MINDLINK_GIT_HASH={hash}");
    }
    println!("cargo:rerun-if-changed=../../.git/HEAD");
}
