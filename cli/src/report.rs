//! # pubstream Reporting (`report`)
//!
//! File: cli/src/report.rs
//!
//! ## Overview
//!
//! The parser and the materializer never print. They describe what happened as
//! [`StreamEvent`] values and hand them to whatever [`Reporter`] the command
//! injected. The console reporter turns events into the familiar listing:
//!
//! ```text
//! Files parsed: 2
//!   - backend/app/main.py
//!   - frontend/src/app/app.module.ts
//! [WROTE] /opt/hydrometeo/backend/app/main.py
//! [BACKUP] /opt/hydrometeo/frontend/src/app/app.module.ts -> ...bak.20240309-070501
//! [WROTE] /opt/hydrometeo/frontend/src/app/app.module.ts
//! Written: 2, failed: 0, invalid: 0
//! ```
//!
//! [`RunReport`] is the machine-readable tally of a run, written as TOML when
//! `--report` is given.
//!
use crate::core::error::Result;
use crate::materialize::MaterializeSummary;
use crate::stream::ParseError;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Something the core did that a user may want to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    RootCreated { root: PathBuf },
    Parsed { paths: Vec<String> },
    InvalidHeaders { errors: Vec<ParseError> },
    Wrote { destination: PathBuf, bytes: u64 },
    DryRun { destination: PathBuf, bytes: u64 },
    BackedUp { original: PathBuf, backup: PathBuf },
    WriteFailed { path: String, reason: String },
    Archived { output: PathBuf, files: usize },
    ArchiveFailed { output: PathBuf, reason: String },
}

/// Sink for [`StreamEvent`]s.
pub trait Reporter {
    fn report(&mut self, event: StreamEvent);
}

/// Prints events for a person at a terminal.
///
/// Quiet mode drops everything except failures, which always go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::WriteFailed { path, reason } => eprintln!("[ERROR] {path}: {reason}"),
            StreamEvent::ArchiveFailed { output, reason } => {
                eprintln!("[ERROR] archive {}: {reason}", output.display())
            }
            _ if self.quiet => {}
            StreamEvent::RootCreated { root } => {
                println!("[+] Created project root: {}", root.display())
            }
            StreamEvent::Parsed { paths } => {
                println!("Files parsed: {}", paths.len());
                for path in paths {
                    println!("  - {path}");
                }
            }
            StreamEvent::InvalidHeaders { errors } => {
                if errors.is_empty() {
                    return;
                }
                println!("Invalid file headers: {}", errors.len());
                for error in errors {
                    println!(
                        "  line {}: {} -> {} ({})",
                        error.line_number, error.original_line, error.parsed_path, error.reason
                    );
                }
            }
            StreamEvent::Wrote { destination, .. } => {
                println!("[WROTE] {}", destination.display())
            }
            StreamEvent::DryRun { destination, bytes } => {
                println!("[DRY] {} ({bytes} bytes)", destination.display())
            }
            StreamEvent::BackedUp { original, backup } => {
                println!("[BACKUP] {} -> {}", original.display(), backup.display())
            }
            StreamEvent::Archived { output, files } => {
                println!("[ARCHIVE] {} ({files} files)", output.display())
            }
        }
    }
}

/// Keeps every event, for assertions in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub events: Vec<StreamEvent>,
}

#[cfg(test)]
impl Reporter for MemoryReporter {
    fn report(&mut self, event: StreamEvent) {
        self.events.push(event);
    }
}

/// A write that did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedWrite {
    pub path: String,
    pub reason: String,
}

/// Final tally of an `apply` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub root: String,
    pub dry_run: bool,
    pub parsed: usize,
    pub invalid: usize,
    pub written: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    pub invalid_headers: Vec<ParseError>,
    pub failures: Vec<FailedWrite>,
}

impl RunReport {
    pub fn new(
        root: &Path,
        dry_run: bool,
        parsed: usize,
        invalid_headers: &[ParseError],
        summary: &MaterializeSummary,
    ) -> Self {
        Self {
            root: root.display().to_string(),
            dry_run,
            parsed,
            invalid: invalid_headers.len(),
            written: summary.succeeded(),
            failed: summary.failed(),
            archive: None,
            invalid_headers: invalid_headers.to_vec(),
            failures: summary
                .failures()
                .map(|r| FailedWrite {
                    path: r.path.clone(),
                    reason: r.reason.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }

    /// The one-line tally printed at the end of every run.
    pub fn counts_line(&self) -> String {
        format!(
            "Written: {}, failed: {}, invalid: {}",
            self.written, self.failed, self.invalid
        )
    }

    /// Writes the report as TOML.
    pub fn write_toml(&self, path: &Path) -> Result<()> {
        let body = toml::to_string_pretty(self).context("Failed to serialize run report")?;
        fs::write(path, body).with_context(|| format!("Failed to write report {:?}", path))?;
        info!("Wrote run report to {:?}", path);
        Ok(())
    }
}
