//! # pubstream Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared building blocks that know nothing about streams or commands:
//!
//! - **`archive`**: Packs a directory tree into a `.zip` or `.tar.gz`.
//! - **`fs`**: Reading input, creating directories, writing bytes.
//!

/// Directory-to-archive packing (ZIP and gzipped TAR).
pub mod archive;
/// Filesystem I/O helpers.
pub mod fs;
