//! # pubstream Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! This module centralizes the filesystem input/output operations pubstream
//! needs. It wraps `std::fs` and `std::io` calls with `anyhow::Context` so a
//! failure always names the path involved.
//!
//! ## Architecture
//!
//! - **`ensure_dir_exists`**: Creates a directory (and its parents) if missing and
//!   verifies an existing path is a directory. Reports whether it created it.
//! - **`read_input`**: Reads the stream text from a file or, for `-`, from stdin.
//!   A leading UTF-8 byte order mark is dropped.
//! - **`write_bytes_to_file`**: Replaces a file's contents in full.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::fs::io;
//!
//! let created = io::ensure_dir_exists(Path::new("./site"))?;
//! let text = io::read_input("-")?;
//! io::write_bytes_to_file(Path::new("./site/index.html"), b"<html></html>\n")?;
//! ```
//!
use crate::core::error::{Result, StreamError};
use anyhow::Context;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Source name that selects standard input.
pub const STDIN_SENTINEL: &str = "-";

const BOM: char = '\u{feff}';

/// Ensures that a directory exists at the specified path.
///
/// If the path does not exist, the directory is created together with any
/// missing parents (similar to `mkdir -p`).
///
/// # Arguments
///
/// * `path` - The directory path to ensure exists.
///
/// # Returns
///
/// * `Result<bool>` - `Ok(true)` if the directory was created by this call,
///   `Ok(false)` if it already existed.
///
/// # Errors
///
/// Returns an `Err` if:
/// - The path exists but is not a directory.
/// - Creating the directory fails (e.g., due to permissions).
pub fn ensure_dir_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
        Ok(true)
    } else if !path.is_dir() {
        anyhow::bail!(StreamError::FileSystem(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    } else {
        debug!("Directory already exists: {:?}", path);
        Ok(false)
    }
}

/// Reads the whole publication stream.
///
/// # Arguments
///
/// * `source` - A file path, or `-` for standard input.
///
/// # Returns
///
/// * `Result<String>` - The decoded text with any leading BOM removed.
///
/// # Errors
///
/// Returns an `Err` if the source cannot be opened or read, or is not valid UTF-8.
pub fn read_input(source: &str) -> Result<String> {
    let text = if source == STDIN_SENTINEL {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stream from stdin")?;
        buffer
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read file {:?}", source))?
    };
    debug!("Read {} bytes of stream input from {}", text.len(), source);
    Ok(match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Writes bytes to `path`, replacing any existing file in full.
///
/// The parent directory must already exist.
///
/// # Errors
///
/// Returns an `Err` if the file cannot be created or written (e.g., permissions,
/// disk full), with context naming the file.
pub fn write_bytes_to_file(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write to file {:?}", path))?;
    debug!("Wrote {} bytes to file: {:?}", content.len(), path);
    Ok(())
}
