//! # pubstream Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout pubstream. Errors fall
//! into two groups that are handled very differently:
//!
//! - **Run-level failures** abort the whole invocation and map to a distinct
//!   process exit status: the input cannot be read (`InputUnreadable`), the
//!   input holds no file blocks (`NoBlocks`), or the configuration is broken.
//! - **Per-entry failures** (`PathTraversal`, `Write`) are never propagated past
//!   the materializer. They are rendered into a `WriteResult` so the batch
//!   always completes and reports a full tally.
//!
//! ## Architecture
//!
//! - `StreamError`: a `thiserror` enum naming every failure category.
//! - `Result<T>`: an alias for `anyhow::Result<T>` so call sites can attach
//!   context with `anyhow::Context`. `main` downcasts back to `StreamError`
//!   to pick the exit status.
//!
//! ## Examples
//!
//! ```rust
//! let text = read_input(&args.input)
//!     .map_err(|e| StreamError::InputUnreadable { source_name: args.input.clone(), reason: e.to_string() })?;
//!
//! match err.downcast_ref::<StreamError>() {
//!     Some(stream_err) => std::process::exit(stream_err.exit_code()),
//!     None => std::process::exit(1),
//! }
//! ```
//!
use thiserror::Error;

/// Exit status for fatal errors without a dedicated code.
pub const EXIT_GENERIC: i32 = 1;
/// Exit status when the input source cannot be read.
pub const EXIT_INPUT_UNREADABLE: i32 = 2;
/// Exit status when readable input contains zero file blocks.
pub const EXIT_NO_BLOCKS: i32 = 3;

/// Custom error type for pubstream.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Input not readable: {source_name}: {reason}")]
    InputUnreadable { source_name: String, reason: String },

    #[error("No FILE blocks found.")]
    NoBlocks,

    #[error("path traversal: '{path}' resolves outside of the root")]
    PathTraversal { path: String },

    #[error("Failed to write '{path}': {reason}")]
    Write { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),
}

impl StreamError {
    /// Process exit status for this error when it aborts a run.
    pub fn exit_code(&self) -> i32 {
        match self {
            StreamError::InputUnreadable { .. } => EXIT_INPUT_UNREADABLE,
            StreamError::NoBlocks => EXIT_NO_BLOCKS,
            _ => EXIT_GENERIC,
        }
    }
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

/// Picks the exit status for an error that reached `main`.
///
/// Walks the `anyhow` chain so a `StreamError` wrapped in extra context still
/// maps to its dedicated status.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StreamError>())
        .map(StreamError::exit_code)
        .unwrap_or(EXIT_GENERIC)
}
