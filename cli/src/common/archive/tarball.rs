//! # pubstream TAR Archive Operations (`common::archive::tarball`)
//!
//! File: cli/src/common/archive/tarball.rs
//!
//! ## Overview
//!
//! Writes gzipped tarballs (`.tar.gz`, `.tgz`). The `tar` crate builds the
//! archive structure and `flate2` compresses the stream as it is written, so
//! the archive never has to fit in memory.
//!
use super::ArchiveMember;
use crate::core::error::Result;
use anyhow::Context;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::Path;

/// # Write Gzipped TAR (`write_tar_gz`)
///
/// Streams `members` into a gzipped tarball at `output`.
///
/// ## Errors
///
/// Returns an `Err` if:
/// - The output file cannot be created.
/// - Any member cannot be read or appended (e.g., permissions issues).
/// - Finishing the TAR archive structure or the Gzip stream fails.
pub fn write_tar_gz(output: &Path, members: &[ArchiveMember]) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create archive {:?}", output))?;
    // Wrap the file with a Gzip encoder using default compression level.
    let enc = GzEncoder::new(file, Compression::default());
    let mut tar_builder = tar::Builder::new(enc);

    for member in members {
        tar_builder
            .append_path_with_name(&member.source, &member.name)
            .with_context(|| {
                format!(
                    "Failed to add {:?} to the tar archive as {}",
                    member.source, member.name
                )
            })?;
    }

    // Finalize the TAR structure, then the Gzip stream (writes the footer).
    let encoder = tar_builder
        .into_inner()
        .context("Failed to finalize tar archive structure")?;
    encoder
        .finish()
        .context("Failed to finish gzip compression stream")?;

    Ok(())
}
