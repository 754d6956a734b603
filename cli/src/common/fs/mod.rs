//! # pubstream Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! Filesystem helpers shared by the materializer and the command handlers.
//! Only basic I/O lives here for now; archive creation has its own module
//! (`common::archive`).
//!

/// Contains basic file I/O operations (e.g., `ensure_dir_exists`, `read_input`, `write_bytes_to_file`).
pub mod io;
