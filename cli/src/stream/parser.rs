//! # Publication Stream Parser (`stream::parser`)
//!
//! File: cli/src/stream/parser.rs
//!
//! ## Overview
//!
//! The parser is a two-state machine driven one line at a time:
//!
//! - **Scanning**: outside any block. Everything except a header is ignored.
//! - **Capturing**: inside a block for a validated path, buffering content.
//!
//! A header always closes the block in progress, so generator output that
//! forgets `END FILE` still splits correctly. A header with an unsafe path
//! records a [`ParseError`] and drops its block. An unterminated final block is
//! accepted.
//!
//! ## Architecture
//!
//! The state is an owned enum passed by value through [`step`], which returns
//! the next state together with anything the line emitted. Closing a block is
//! the explicit [`ParserState::flush`] transition. [`parse_stream`] folds the
//! whole input through `step` and flushes once more at the end.
//!
use super::path::{normalize_path, validate_path};
use super::sanitize::sanitize_content;
use super::{FileEntry, ParseError, ParsedStream};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

/// `FILE: path` or `BEGIN FILE: path`, optionally wrapped in dash decorations.
static FILE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:[-–—]{0,3}\s*)?(?:BEGIN\s+FILE:|FILE:)\s*(\S.*?)\s*(?:[-–—]{2,}.*?)?\s*$")
        .unwrap()
});

static FILE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*END\s+FILE\s*$").unwrap());

/// Language and tooling tags that chat-style generators print above code.
const SKIP_TOKENS: [&str; 17] = [
    "copy", "edit", "ts", "tsx", "js", "jsx", "json", "bash", "sh", "powershell", "ps1", "yaml",
    "yml", "dockerfile", "sql", "md", "txt",
];

/// Parser state between two lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    Scanning,
    Capturing { path: String, buffer: Vec<String> },
}

impl ParserState {
    /// Closes the block in progress, if any.
    pub fn flush(self) -> Option<FileEntry> {
        match self {
            ParserState::Scanning => None,
            ParserState::Capturing { path, buffer } => Some(FileEntry {
                content: sanitize_content(&buffer),
                path,
            }),
        }
    }
}

/// What a single line emitted on its way to the next state.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Emitted {
    pub entry: Option<FileEntry>,
    pub error: Option<ParseError>,
}

/// Advances the state machine by one line.
///
/// `line_number` is 1-based and only used for error reporting.
pub fn step(state: ParserState, line_number: usize, line: &str) -> (ParserState, Emitted) {
    if let Some(captures) = FILE_HEADER.captures(line) {
        let entry = state.flush();
        let raw_path = captures.get(1).map_or("", |m| m.as_str());
        let path = normalize_path(raw_path);

        return match validate_path(&path) {
            Ok(()) => {
                trace!("Line {}: opening block for '{}'", line_number, path);
                let next = ParserState::Capturing {
                    path,
                    buffer: Vec::new(),
                };
                (next, Emitted { entry, error: None })
            }
            Err(invalid) => {
                debug!(
                    "Line {}: rejecting header path '{}': {}",
                    line_number, path, invalid
                );
                let error = ParseError {
                    line_number,
                    original_line: line.trim().to_string(),
                    parsed_path: path,
                    reason: invalid.reason,
                };
                (
                    ParserState::Scanning,
                    Emitted {
                        entry,
                        error: Some(error),
                    },
                )
            }
        };
    }

    match state {
        ParserState::Scanning => (ParserState::Scanning, Emitted::default()),
        capturing if FILE_END.is_match(line) => {
            let entry = capturing.flush();
            (ParserState::Scanning, Emitted { entry, error: None })
        }
        ParserState::Capturing { path, mut buffer } => {
            if !is_skipped(line) {
                buffer.push(line.to_string());
            }
            (ParserState::Capturing { path, buffer }, Emitted::default())
        }
    }
}

/// Fence delimiters and bare language tags never reach the written file.
fn is_skipped(line: &str) -> bool {
    let folded = line.trim().to_lowercase();
    folded.starts_with("```") || folded.starts_with("~~~") || SKIP_TOKENS.contains(&folded.as_str())
}

/// Parses a whole stream.
///
/// Lines are split on LF, CRLF and lone CR. Entries come back in source order;
/// two blocks for the same path yield two entries.
pub fn parse_stream(text: &str) -> ParsedStream {
    let unified = text.replace("\r\n", "\n");
    let mut lines: Vec<&str> = unified.split(['\n', '\r']).collect();
    if unified.is_empty() || unified.ends_with(['\n', '\r']) {
        lines.pop();
    }

    let mut parsed = ParsedStream::default();
    let mut state = ParserState::Scanning;
    for (index, line) in lines.into_iter().enumerate() {
        let (next, emitted) = step(state, index + 1, line);
        state = next;
        parsed.entries.extend(emitted.entry);
        parsed.errors.extend(emitted.error);
    }
    parsed.entries.extend(state.flush());

    debug!(
        "Parsed {} file block(s), {} invalid header(s)",
        parsed.entries.len(),
        parsed.errors.len()
    );
    parsed
}
