//! # pubstream Pack Command (`pubstream pack`)
//!
//! File: cli/src/commands/pack.rs
//!
//! ## Overview
//!
//! Packs an existing project root into one archive without reading any stream.
//! It is the archive step of `apply --zip-out` on its own, for trees that were
//! materialized earlier or edited by hand afterwards.
//!
//! ## Examples
//!
//! ```bash
//! pubstream pack ./site --out site.zip
//! pubstream pack ./site -o site.tar.gz --topname Site
//! ```
//!
use crate::common::archive;
use crate::core::config;
use crate::core::error::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

/// # Pack Arguments (`PackArgs`)
#[derive(Parser, Debug)]
pub struct PackArgs {
    /// Directory to pack.
    root: PathBuf,

    /// Archive to create (`.zip`, `.tar.gz` or `.tgz`).
    #[arg(long, short = 'o')]
    out: PathBuf,

    /// Top-level folder name inside the archive [default: from config, else GidroMeteo].
    #[arg(long)]
    topname: Option<String>,
}

/// # Handle Pack Command (`handle_pack`)
///
/// ## Errors
///
/// Returns an `Err` if the configuration is invalid, the root is not a
/// directory, or the archive cannot be written.
pub fn handle_pack(args: PackArgs, config_path: Option<&Path>) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let topname = args.topname.unwrap_or_else(|| cfg.topname());
    info!("Packing {:?} under '{}'", args.root, topname);

    let summary = archive::build_archive(&args.root, &args.out, &topname)?;
    println!(
        "[ARCHIVE] {} ({} files, {})",
        summary.output.display(),
        summary.files,
        summary.format
    );
    Ok(())
}
