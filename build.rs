//! Embeds build provenance for `catalog-admin --version`.
//!
//! `GIT_HASH` is the short commit hash (empty outside a git checkout) and
//! `ON_RELEASE_TAG` is `true` when HEAD is exactly a tag, in which case the
//! crate version is shown instead of the hash.

use std::process::{Command, Output};

fn git(args: &[&str]) -> Option<Output> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|out| out.status.success())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let commit = git(&["rev-parse", "--short", "HEAD"])
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_default();
    let release = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    println!("cargo:rustc-env=GIT_HASH={commit}");
    println!("cargo:rustc-env=ON_RELEASE_TAG={release}");
}
