//! # pubstream Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! `pubstream` turns a publication stream into files on disk. A stream is plain
//! text (usually pasted from a generator or a chat transcript) where each file is
//! introduced by a `FILE: <relative path>` header and optionally closed by
//! `END FILE`. This entry point:
//! - Parses the command line with Clap.
//! - Sets up `tracing` from the `-v` count (or `RUST_LOG`).
//! - Routes to the subcommand handler.
//! - Maps any error to the documented exit status.
//!
//! ## Architecture
//!
//! - `stream`: Header recognition, path normalization and validation, content cleanup.
//! - `materialize`: Safe root resolution, line endings, encoding, backups, writes.
//! - `report`: Events emitted by the core and the console/TOML renderings of them.
//! - `commands`: The `apply` and `pack` subcommands.
//! - `common`: Archive packing and filesystem helpers.
//! - `core`: Configuration and error types.
//!
//! ## Examples
//!
//! ```bash
//! pubstream apply --input stream.txt --root ./site
//! pubstream -vv apply --dry-run < stream.txt
//! pubstream pack ./site --out site.zip
//! ```
//!
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod common;
mod core;
mod materialize;
mod report;
mod stream;

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "pubstream",
    about = "Materialize FILE: blocks from a publication stream into a project tree",
    long_about = "Reads a text stream of `FILE: <path>` blocks and writes each block as a file\n\
                  under a project root, refusing unsafe paths. Can archive the result.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Read settings from this TOML file instead of the user and project config.
    #[arg(long, global = true, env = "PUBSTREAM_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Write the files of a publication stream under a project root.
    #[command(alias = "a")]
    Apply(commands::apply::ApplyArgs),
    /// Pack a project root into a .zip or .tar.gz archive.
    #[command(alias = "p")]
    Pack(commands::pack::PackArgs),
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let config_path = cli.config.as_deref();
    let command_result = match cli.command {
        Commands::Apply(args) => commands::apply::handle_apply(args, config_path),
        Commands::Pack(args) => commands::pack::handle_pack(args, config_path),
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(crate::core::error::exit_code_for(&e));
    }
}
