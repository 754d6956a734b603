//! # pubstream Stream Parsing (`stream`)
//!
//! File: cli/src/stream/mod.rs
//!
//! ## Overview
//!
//! A publication stream is plain text carrying several embedded files:
//!
//! ```text
//! --- FILE: backend/app/main.py ---
//! ```python
//! print("hello")
//! ```
//! END FILE
//! BEGIN FILE: frontend/src/app/app.module.ts
//! ...
//! ```
//!
//! This module turns such text into an ordered list of [`FileEntry`] values,
//! collecting a [`ParseError`] for every header whose path is unsafe. It never
//! touches the filesystem and never interprets the content of a block.
//!
//! ## Architecture
//!
//! - **`path`**: Normalizes the path captured from a header and checks it
//!   against portability and safety rules.
//! - **`sanitize`**: Trims blank lines around a captured block.
//! - **`parser`**: The line-driven state machine that ties the two together.
//!
use serde::Serialize;

pub mod parser;
pub mod path;
pub mod sanitize;

pub use parser::parse_stream;

/// One file captured from the stream.
///
/// `path` is normalized (forward slashes, no leading `./` or `/`) and has passed
/// [`path::validate_path`]. `content` may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

/// A header line whose path was rejected. The block that followed it is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    /// 1-based line number of the header.
    pub line_number: usize,
    /// The header line as it appeared, trimmed.
    pub original_line: String,
    /// Best-effort normalized path.
    pub parsed_path: String,
    pub reason: String,
}

/// Output of one parse pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedStream {
    /// Entries in source order. The same path may appear more than once.
    pub entries: Vec<FileEntry>,
    pub errors: Vec<ParseError>,
}
