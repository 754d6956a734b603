//! # Header Path Normalization and Validation (`stream::path`)
//!
//! File: cli/src/stream/path.rs
//!
//! ## Overview
//!
//! Paths arrive in headers written by people and text generators, so they carry
//! quotes, trailing `-- comment` decorations and Windows separators. They are
//! first normalized, then checked against rules that keep the written tree
//! portable and inside its root:
//!
//! 1. Empty or whitespace-only paths are rejected.
//! 2. Characters Windows cannot store (`< > " | ? *`) are rejected.
//! 3. Segments whose stem is a reserved device name (`CON`, `NUL`, `COM1`, ...)
//!    or that end with a dot or space are rejected. This also rejects `.` and
//!    `..` segments.
//! 4. Leftovers of the header pattern itself (`\FILE:`, `\s`, `.+?`) are
//!    rejected, which catches generators echoing the pattern instead of a path.
//!
//! Validation is purely textual. Whether the destination stays under the root
//! once symlinks are resolved is checked again at write time by the
//! materializer.
//!
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Two or more dash-like characters and everything after them.
static DECORATIVE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[-–—]{2,}.*$").unwrap());

const INVALID_CHARS: [char; 6] = ['<', '>', '"', '|', '?', '*'];

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Fragments of the header pattern leaking into a captured path, compared
/// case-insensitively. Normalization turns `\` into `/`, so the slash forms of
/// `\FILE:` and `\s+` are listed as well.
const REGEX_REMNANTS: [&str; 5] = ["\\file:", "/file:", "\\s", "/s+", ".+?"];

/// Why a path was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct InvalidPath {
    pub reason: String,
}

impl InvalidPath {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Normalizes the raw path captured from a header line.
///
/// Drops a trailing decorative suffix (`-- comment`, `——`), trims whitespace
/// and surrounding quotes, converts backslashes to forward slashes and strips
/// leading `./` and `/` prefixes.
///
/// ```rust
/// assert_eq!(normalize_path(r#" ".\src\main.rs" -- entry point"#), "src/main.rs");
/// ```
pub fn normalize_path(raw: &str) -> String {
    let undecorated = DECORATIVE_SUFFIX.replace(raw.trim(), "");
    let unquoted = undecorated
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    let slashed = unquoted.replace('\\', "/");

    let mut rel = slashed.as_str();
    loop {
        if let Some(rest) = rel.strip_prefix("./") {
            rel = rest;
        } else if let Some(rest) = rel.strip_prefix('/') {
            rel = rest;
        } else {
            break;
        }
    }
    rel.to_string()
}

/// Checks a normalized path. The first failing rule determines the reason.
pub fn validate_path(path: &str) -> Result<(), InvalidPath> {
    if path.trim().is_empty() {
        return Err(InvalidPath::new("empty path"));
    }

    if let Some(ch) = INVALID_CHARS.iter().find(|ch| path.contains(**ch)) {
        return Err(InvalidPath::new(format!("invalid character '{ch}'")));
    }

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let stem = segment.split('.').next().unwrap_or(segment);
        if RESERVED_NAMES.contains(&stem.to_uppercase().as_str()) {
            return Err(InvalidPath::new(format!("reserved name '{segment}'")));
        }
        if segment.ends_with('.') || segment.ends_with(' ') {
            return Err(InvalidPath::new(format!(
                "segment '{segment}' ends with a dot or space"
            )));
        }
    }

    let folded = path.to_ascii_lowercase();
    if REGEX_REMNANTS.iter().any(|remnant| folded.contains(remnant)) {
        return Err(InvalidPath::new("regex remnants"));
    }

    Ok(())
}
