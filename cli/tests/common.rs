//! # pubstream CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration test crates in `cli/tests/`. Every test
//! runs the real binary inside a fresh temporary directory so no user or project
//! configuration leaks in.
//!

#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// # Get pubstream Command (`pubstream_cmd`)
///
/// Returns an `assert_cmd::Command` for the compiled `pubstream` binary, with
/// `PUBSTREAM_CONFIG` and `RUST_LOG` cleared and `HOME`/`XDG_CONFIG_HOME`
/// pointing at `workdir` so only the configuration the test writes is seen.
///
/// ## Panics
/// Panics if the `pubstream` binary cannot be found via `Command::cargo_bin`.
pub fn pubstream_cmd(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pubstream").expect("Failed to find pubstream binary for testing");
    cmd.current_dir(workdir)
        .env_remove("PUBSTREAM_CONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", workdir)
        .env("XDG_CONFIG_HOME", workdir.join(".config"));
    cmd
}

/// Creates a temp directory holding `stream.txt` with `content`.
pub fn workspace_with_stream(content: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("stream.txt"), content).expect("Failed to write stream");
    dir
}
