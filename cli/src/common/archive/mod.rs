//! # pubstream Archive Utilities Module (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! This module packs a materialized directory tree into a single compressed
//! archive so it can be handed on (uploaded, attached, deployed) as one file.
//! Every regular file under the root is stored as `<top name>/<relative path>`,
//! with forward slashes regardless of the host's separator.
//!
//! ## Architecture
//!
//! - **`collect_members`** walks the root with `walkdir` (sorted by file name so
//!   archives are reproducible) and computes each member's archive name.
//!   Directories and symlinks are not stored. The output file itself is skipped
//!   when it sits inside the root.
//! - **`zipfile`**: Writes a Deflate-compressed ZIP (the default).
//! - **`tarball`**: Writes a gzipped tarball, chosen when the output name ends in
//!   `.tar.gz` or `.tgz`.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive;
//!
//! let summary = archive::build_archive(Path::new("./site"), Path::new("site.zip"), "Site")?;
//! println!("{} files in {}", summary.files, summary.output.display());
//! ```
//!
use crate::core::error::{Result, StreamError};
use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub mod tarball;
pub mod zipfile;

/// Archive container format, picked from the output file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveFormat::TarGz
        } else {
            ArchiveFormat::Zip
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::TarGz => write!(f, "tar.gz"),
        }
    }
}

/// A file on disk and the name it gets inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub source: PathBuf,
    pub name: String,
}

/// What `build_archive` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub output: PathBuf,
    pub format: ArchiveFormat,
    pub files: usize,
}

/// # Build Archive (`build_archive`)
///
/// Packs every regular file under `root` into `output`.
///
/// ## Arguments
///
/// * `root` - The directory to pack. Must exist.
/// * `output` - The archive to create. An existing file is replaced.
/// * `top_name` - Folder name prefixed to every stored path.
///
/// ## Errors
///
/// Returns an `Err` if `root` cannot be walked, the output cannot be created, or
/// any member cannot be read or written.
pub fn build_archive(root: &Path, output: &Path, top_name: &str) -> Result<ArchiveSummary> {
    if !root.is_dir() {
        anyhow::bail!(StreamError::Archive(format!(
            "Root is not a directory: {:?}",
            root
        )));
    }
    let format = ArchiveFormat::from_path(output);
    let members = collect_members(root, output, top_name)?;
    info!(
        "Packing {} files from {:?} into {} archive {:?}",
        members.len(),
        root,
        format,
        output
    );

    match format {
        ArchiveFormat::Zip => zipfile::write_zip(output, &members)?,
        ArchiveFormat::TarGz => tarball::write_tar_gz(output, &members)?,
    }

    Ok(ArchiveSummary {
        output: output.to_path_buf(),
        format,
        files: members.len(),
    })
}

/// Lists the regular files under `root` with their archive names.
pub fn collect_members(root: &Path, output: &Path, top_name: &str) -> Result<Vec<ArchiveMember>> {
    let skip = output.canonicalize().ok();
    let mut members = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk directory {:?}", root))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if skip.is_some() && entry.path().canonicalize().ok() == skip {
            debug!("Skipping the archive itself: {:?}", entry.path());
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{:?} is not under {:?}", entry.path(), root))?;
        let relative_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        members.push(ArchiveMember {
            source: entry.path().to_path_buf(),
            name: format!("{top_name}/{relative_name}"),
        });
    }
    Ok(members)
}
