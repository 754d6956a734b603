//! # pubstream Apply Command (`pubstream apply`)
//!
//! File: cli/src/commands/apply.rs
//!
//! ## Overview
//!
//! Runs the whole pipeline for one publication stream:
//!
//! 1. Load configuration and settle every setting (flags win over config).
//! 2. Create the destination root if it is missing.
//! 3. Read the stream from a file or stdin.
//! 4. Parse it into file entries, listing invalid headers.
//! 5. Materialize the entries under the root (or simulate it with `--dry-run`).
//! 6. Optionally pack the root into an archive (`--zip-out`), never in dry-run.
//! 7. Print the final tally and optionally write it as TOML (`--report`).
//!
//! ## Exit Status
//!
//! Partial write failures still exit with 0; the tally shows them. An unreadable
//! input exits with 2 and an input without any `FILE:` block exits with 3.
//!
//! ## Examples
//!
//! ```bash
//! pubstream apply --input stream.txt --root ./site --eol lf
//! cat stream.txt | pubstream apply --root ./site --backup --zip-out site.zip
//! pubstream apply -i stream.txt -r ./site --dry-run --report run.toml
//! ```
//!
use crate::common::{archive, fs::io};
use crate::core::config::{self, Config};
use crate::core::error::{Result, StreamError};
use crate::materialize::{self, Encoding, LineEnding, MaterializeOptions};
use crate::report::{ConsoleReporter, Reporter, RunReport, StreamEvent};
use crate::stream;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// # Apply Arguments (`ApplyArgs`)
///
/// Command-line arguments for `pubstream apply`. Options left unset fall back to
/// the configuration file, then to built-in defaults.
#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Path to the stream file, or "-" for stdin.
    #[arg(long, short = 'i', default_value = io::STDIN_SENTINEL)]
    input: String,

    /// Project root the files are written under. Created if absent.
    #[arg(long, short = 'r')]
    root: Option<PathBuf>,

    /// Text encoding of the written files, e.g. utf-8, utf-8-sig, windows-1251 [default: utf-8].
    #[arg(long)]
    encoding: Option<Encoding>,

    /// Line endings of the written files [default: crlf].
    #[arg(long, value_enum)]
    eol: Option<LineEnding>,

    /// Report what would be written without touching any file.
    #[arg(long)]
    dry_run: bool,

    /// Copy existing files to `<name>.bak.<timestamp>` before overwriting them.
    #[arg(long)]
    backup: bool,

    /// Only print errors and the final counts.
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Pack the root into this archive after writing (`.zip`, `.tar.gz` or `.tgz`).
    #[arg(long)]
    zip_out: Option<PathBuf>,

    /// Top-level folder name inside the archive [default: GidroMeteo].
    #[arg(long)]
    zip_topname: Option<String>,

    /// Write a TOML report of the run to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

/// Every setting of a run after flags and configuration are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ApplySettings {
    root: PathBuf,
    options: MaterializeOptions,
    archive_out: Option<PathBuf>,
    archive_topname: String,
}

impl ApplySettings {
    fn resolve(args: &ApplyArgs, cfg: &Config) -> Self {
        Self {
            root: args.root.clone().unwrap_or_else(|| cfg.root()),
            options: MaterializeOptions {
                line_ending: args.eol.or(cfg.apply.eol).unwrap_or_default(),
                encoding: args.encoding.or(cfg.apply.encoding).unwrap_or_default(),
                dry_run: args.dry_run,
                backup: args.backup || cfg.apply.backup.unwrap_or(false),
            },
            archive_out: args.zip_out.clone(),
            archive_topname: args.zip_topname.clone().unwrap_or_else(|| cfg.topname()),
        }
    }
}

/// # Handle Apply Command (`handle_apply`)
///
/// ## Arguments
///
/// * `args` - The parsed `ApplyArgs`.
/// * `config_path` - An explicit config file from `--config`, if any.
///
/// ## Errors
///
/// Returns `StreamError::InputUnreadable` or `StreamError::NoBlocks` for the two
/// dedicated failure modes, or any error from config loading, root creation or
/// root resolution. Individual write failures are not errors.
pub fn handle_apply(args: ApplyArgs, config_path: Option<&Path>) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let settings = ApplySettings::resolve(&args, &cfg);
    debug!("Apply settings: {:?}", settings);
    let mut reporter = ConsoleReporter::new(args.quiet);
    run_apply(&args.input, &settings, args.report.as_deref(), &mut reporter)
}

fn run_apply(
    input: &str,
    settings: &ApplySettings,
    report_path: Option<&Path>,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    if io::ensure_dir_exists(&settings.root)? {
        reporter.report(StreamEvent::RootCreated {
            root: settings.root.clone(),
        });
    }

    let text = io::read_input(input).map_err(|e| StreamError::InputUnreadable {
        source_name: input.to_string(),
        reason: format!("{e:#}"),
    })?;

    let parsed = stream::parse_stream(&text);
    reporter.report(StreamEvent::Parsed {
        paths: parsed.entries.iter().map(|e| e.path.clone()).collect(),
    });
    reporter.report(StreamEvent::InvalidHeaders {
        errors: parsed.errors.clone(),
    });
    if parsed.entries.is_empty() {
        return Err(StreamError::NoBlocks.into());
    }

    let summary =
        materialize::materialize(&parsed.entries, &settings.root, &settings.options, reporter)?;
    let mut run_report = RunReport::new(
        &settings.root,
        settings.options.dry_run,
        parsed.entries.len(),
        &parsed.errors,
        &summary,
    );

    if let Some(output) = &settings.archive_out {
        if settings.options.dry_run {
            info!("Dry run: skipping archive {:?}", output);
        } else {
            match archive::build_archive(&settings.root, output, &settings.archive_topname) {
                Ok(archived) => {
                    run_report.archive = Some(output.display().to_string());
                    reporter.report(StreamEvent::Archived {
                        output: archived.output,
                        files: archived.files,
                    });
                }
                Err(e) => {
                    warn!("Archive creation failed: {:?}", e);
                    reporter.report(StreamEvent::ArchiveFailed {
                        output: output.clone(),
                        reason: format!("{e:#}"),
                    });
                }
            }
        }
    }

    println!("{}", run_report.counts_line());
    if let Some(path) = report_path {
        run_report.write_toml(path)?;
    }
    Ok(())
}
