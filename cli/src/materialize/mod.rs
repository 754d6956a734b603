//! # pubstream File Materializer (`materialize`)
//!
//! File: cli/src/materialize/mod.rs
//!
//! ## Overview
//!
//! This module writes parsed [`FileEntry`] values to disk under a root
//! directory. Each entry is handled on its own: a traversal attempt, a
//! permission error or a full disk fails that entry only, and the remaining
//! entries are still attempted. The caller always gets one [`WriteResult`] per
//! entry, in input order.
//!
//! ## Architecture
//!
//! For every entry:
//! 1. **Resolve** the destination against the canonical root (`resolve`). This
//!    is repeated here even though the parser already rejected `..` segments,
//!    because symlinks inside the root can only be followed once a concrete
//!    root is known.
//! 2. **Create** missing parent directories.
//! 3. **Convert** line endings: CRLF and lone CR collapse to LF, then `crlf`
//!    mode expands every LF to CRLF.
//! 4. **Encode** as UTF-8, with a BOM for `utf-8-sig`.
//! 5. **Back up** an existing destination when requested (`backup`).
//! 6. **Write** the bytes, replacing the file in full.
//!
//! In dry-run mode only steps 1, 3 and 4 run, so the reported byte count is the
//! one a real run would write.
//!
//! Progress is not printed here. Every step is sent to the injected
//! [`Reporter`] as a [`StreamEvent`].
//!
mod backup;
mod resolve;

pub use resolve::resolve_under_root;

use crate::common::fs::io;
use crate::core::error::{Result, StreamError};
use crate::report::{Reporter, StreamEvent};
use crate::stream::FileEntry;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Line terminator written to every materialized file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    Lf,
    #[default]
    Crlf,
}

/// Why an encoding label was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("unknown encoding '{0}'")]
    Unknown(String),
    #[error("encoding '{0}' can be read but not written")]
    DecodeOnly(String),
}

/// Text encoding of materialized files.
///
/// Accepts any label `encoding_rs` knows (`utf-8`, `windows-1251`, `cp1251`,
/// `koi8-r`, ...) plus `utf-8-sig`, which is UTF-8 with a byte order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Encoding {
    codec: &'static encoding_rs::Encoding,
    bom: bool,
}

impl Encoding {
    pub fn utf8() -> Self {
        Self {
            codec: encoding_rs::UTF_8,
            bom: false,
        }
    }

    pub fn utf8_sig() -> Self {
        Self {
            codec: encoding_rs::UTF_8,
            bom: true,
        }
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl FromStr for Encoding {
    type Err = EncodingError;

    fn from_str(label: &str) -> std::result::Result<Self, Self::Err> {
        let folded = label.trim().to_ascii_lowercase();
        if matches!(folded.as_str(), "utf-8-sig" | "utf8-sig") {
            return Ok(Self::utf8_sig());
        }
        let codec = encoding_rs::Encoding::for_label(folded.as_bytes())
            .ok_or_else(|| EncodingError::Unknown(label.to_string()))?;
        // UTF-16 and the replacement encoding only decode; encoding_rs writes them as UTF-8.
        if codec.output_encoding() != codec {
            return Err(EncodingError::DecodeOnly(label.to_string()));
        }
        Ok(Self { codec, bom: false })
    }
}

impl TryFrom<String> for Encoding {
    type Error = EncodingError;

    fn try_from(label: String) -> std::result::Result<Self, Self::Error> {
        label.parse()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bom {
            write!(f, "utf-8-sig")
        } else {
            write!(f, "{}", self.codec.name().to_ascii_lowercase())
        }
    }
}

/// Switches that shape a materialization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterializeOptions {
    pub line_ending: LineEnding,
    pub encoding: Encoding,
    pub dry_run: bool,
    pub backup: bool,
}

/// Outcome for a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    /// The entry's relative path.
    pub path: String,
    /// Resolved absolute destination, when resolution succeeded.
    pub destination: Option<PathBuf>,
    pub succeeded: bool,
    pub reason: Option<String>,
    /// Bytes written, or that would have been written in dry-run mode.
    pub bytes_written: Option<u64>,
}

impl WriteResult {
    fn success(path: &str, destination: PathBuf, bytes: u64) -> Self {
        Self {
            path: path.to_string(),
            destination: Some(destination),
            succeeded: true,
            reason: None,
            bytes_written: Some(bytes),
        }
    }

    fn failure(path: &str, destination: Option<PathBuf>, reason: String) -> Self {
        Self {
            path: path.to_string(),
            destination,
            succeeded: false,
            reason: Some(reason),
            bytes_written: None,
        }
    }
}

/// All results of one run, in entry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub results: Vec<WriteResult>,
}

impl MaterializeSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &WriteResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }
}

/// Collapses every CRLF and lone CR to LF, then applies `line_ending`.
pub fn convert_line_endings(content: &str, line_ending: LineEnding) -> String {
    let collapsed = content.replace("\r\n", "\n").replace('\r', "\n");
    match line_ending {
        LineEnding::Lf => collapsed,
        LineEnding::Crlf => collapsed.replace('\n', "\r\n"),
    }
}

/// Encodes converted text into the bytes that land on disk.
///
/// # Errors
///
/// Returns the failure reason when `text` holds characters the target
/// encoding cannot represent.
pub fn encode(text: &str, encoding: Encoding) -> std::result::Result<Vec<u8>, String> {
    let (encoded, _, unmappable) = encoding.codec.encode(text);
    if unmappable {
        return Err(format!(
            "content has characters that cannot be encoded as {encoding}"
        ));
    }
    let mut bytes = Vec::with_capacity(UTF8_BOM.len() + encoded.len());
    if encoding.bom {
        bytes.extend_from_slice(UTF8_BOM);
    }
    bytes.extend_from_slice(&encoded);
    Ok(bytes)
}

/// Writes every entry under `root`.
///
/// # Arguments
///
/// * `entries` - Parsed entries, written in order. A later entry for the same
///   path overwrites an earlier one.
/// * `root` - Existing destination directory.
/// * `options` - Line ending, encoding, dry-run and backup switches.
/// * `reporter` - Receives one event per write, backup or failure.
///
/// # Errors
///
/// Returns an `Err` only if `root` cannot be canonicalized. Per-entry failures
/// are recorded in the returned summary instead.
pub fn materialize(
    entries: &[FileEntry],
    root: &Path,
    options: &MaterializeOptions,
    reporter: &mut dyn Reporter,
) -> Result<MaterializeSummary> {
    let canonical_root = root
        .canonicalize()
        .map_err(|e| StreamError::FileSystem(format!("{}: {}", root.display(), e)))
        .with_context(|| format!("Failed to resolve root directory {:?}", root))?;
    info!(
        "Materializing {} entries under {} (dry run: {})",
        entries.len(),
        canonical_root.display(),
        options.dry_run
    );

    let mut summary = MaterializeSummary::default();
    for entry in entries {
        let result = match write_entry(entry, &canonical_root, options, reporter) {
            Ok((destination, bytes)) => WriteResult::success(&entry.path, destination, bytes),
            Err((destination, err)) => {
                let reason = err.to_string();
                warn!("Failed to materialize '{}': {}", entry.path, reason);
                reporter.report(StreamEvent::WriteFailed {
                    path: entry.path.clone(),
                    reason: reason.clone(),
                });
                WriteResult::failure(&entry.path, destination, reason)
            }
        };
        summary.results.push(result);
    }

    debug!(
        "Materialization finished: {} succeeded, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    Ok(summary)
}

type EntryFailure = (Option<PathBuf>, StreamError);

fn write_entry(
    entry: &FileEntry,
    canonical_root: &Path,
    options: &MaterializeOptions,
    reporter: &mut dyn Reporter,
) -> std::result::Result<(PathBuf, u64), EntryFailure> {
    let destination = resolve_under_root(canonical_root, &entry.path).map_err(|e| (None, e))?;
    let fail = |reason: String| {
        (
            Some(destination.clone()),
            StreamError::Write {
                path: entry.path.clone(),
                reason,
            },
        )
    };

    let text = convert_line_endings(&entry.content, options.line_ending);
    let bytes = encode(&text, options.encoding).map_err(fail)?;
    let byte_count = bytes.len() as u64;

    if options.dry_run {
        reporter.report(StreamEvent::DryRun {
            destination: destination.clone(),
            bytes: byte_count,
        });
        return Ok((destination, byte_count));
    }

    if let Some(parent) = destination.parent() {
        io::ensure_dir_exists(parent).map_err(|e| fail(format!("{e:#}")))?;
    }

    if options.backup {
        if let Some(backup_path) =
            backup::backup_existing(&destination).map_err(|e| fail(format!("backup failed: {e}")))?
        {
            reporter.report(StreamEvent::BackedUp {
                original: destination.clone(),
                backup: backup_path,
            });
        }
    }

    io::write_bytes_to_file(&destination, &bytes).map_err(|e| fail(format!("{e:#}")))?;
    reporter.report(StreamEvent::Wrote {
        destination: destination.clone(),
        bytes: byte_count,
    });
    Ok((destination, byte_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;
    use std::fs;
    use tempfile::tempdir;

    fn entry(path: &str, content: &str) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    fn lf_options() -> MaterializeOptions {
        MaterializeOptions {
            line_ending: LineEnding::Lf,
            ..Default::default()
        }
    }

    #[test]
    fn test_convert_line_endings() {
        assert_eq!(convert_line_endings("a\r\nb\rc\n", LineEnding::Lf), "a\nb\nc\n");
        assert_eq!(
            convert_line_endings("a\r\nb\rc\n", LineEnding::Crlf),
            "a\r\nb\r\nc\r\n"
        );
        assert_eq!(convert_line_endings("", LineEnding::Crlf), "");
    }

    #[test]
    fn test_encode_with_bom() {
        assert_eq!(encode("x", Encoding::utf8()), Ok(b"x".to_vec()));
        assert_eq!(
            encode("x", Encoding::utf8_sig()),
            Ok(vec![0xEF, 0xBB, 0xBF, b'x'])
        );
    }

    #[test]
    fn test_encoding_labels() {
        let cp: Encoding = "cp1251".parse().unwrap();
        assert_eq!(cp.to_string(), "windows-1251");
        assert_eq!("UTF-8-SIG".parse::<Encoding>().unwrap(), Encoding::utf8_sig());
        assert_eq!("utf8".parse::<Encoding>().unwrap(), Encoding::utf8());
        assert_eq!(
            "utf-16le".parse::<Encoding>(),
            Err(EncodingError::DecodeOnly("utf-16le".into()))
        );
        assert_eq!(
            "klingon".parse::<Encoding>(),
            Err(EncodingError::Unknown("klingon".into()))
        );
    }

    #[test]
    fn test_encode_windows_1251() {
        let encoding: Encoding = "windows-1251".parse().unwrap();
        assert_eq!(
            encode("Привет\n", encoding),
            Ok(vec![0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2, b'\n'])
        );
        assert!(encode("日本", encoding).is_err());
    }

    #[test]
    fn test_writes_windows_1251_file() -> Result<()> {
        let root = tempdir()?;
        let mut reporter = MemoryReporter::default();
        let options = MaterializeOptions {
            encoding: "windows-1251".parse()?,
            ..lf_options()
        };

        let summary = materialize(
            &[entry("ru.txt", "Погода\n")],
            root.path(),
            &options,
            &mut reporter,
        )?;

        assert_eq!(summary.succeeded(), 1);
        let bytes = fs::read(root.path().join("ru.txt"))?;
        assert_eq!(bytes, [0xCF, 0xEE, 0xE3, 0xEE, 0xE4, 0xE0, b'\n']);
        let (decoded, _, had_errors) = encoding_rs::WINDOWS_1251.decode(&bytes);
        assert!(!had_errors);
        assert_eq!(decoded, "Погода\n");
        Ok(())
    }

    #[test]
    fn test_unmappable_content_fails_only_that_entry() -> Result<()> {
        let root = tempdir()?;
        let mut reporter = MemoryReporter::default();
        let options = MaterializeOptions {
            encoding: "windows-1251".parse()?,
            ..lf_options()
        };
        let entries = [entry("cjk.txt", "日本\n"), entry("ok.txt", "да\n")];

        let summary = materialize(&entries, root.path(), &options, &mut reporter)?;

        assert_eq!(summary.failed(), 1);
        assert!(summary.results[0]
            .reason
            .as_deref()
            .unwrap()
            .contains("cannot be encoded as windows-1251"));
        assert!(!root.path().join("cjk.txt").exists());
        assert!(root.path().join("ok.txt").exists());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_not_written_through() -> Result<()> {
        let outside = tempdir()?;
        let root = tempdir()?;
        let target = outside.path().join("pwned.txt");
        std::os::unix::fs::symlink(&target, root.path().join("evil.txt"))?;
        let mut reporter = MemoryReporter::default();

        let summary = materialize(
            &[entry("evil.txt", "x\n"), entry("fine.txt", "y\n")],
            root.path(),
            &lf_options(),
            &mut reporter,
        )?;

        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.succeeded(), 1);
        assert!(!target.exists());
        Ok(())
    }

    #[test]
    fn test_writes_entries_with_lf() -> Result<()> {
        let root = tempdir()?;
        let mut reporter = MemoryReporter::default();
        let entries = [
            entry("src/main.rs", "fn main() {}\r\n"),
            entry("empty.txt", ""),
        ];

        let summary = materialize(&entries, root.path(), &lf_options(), &mut reporter)?;

        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 0);
        assert_eq!(
            fs::read_to_string(root.path().join("src/main.rs"))?,
            "fn main() {}\n"
        );
        assert_eq!(fs::read(root.path().join("empty.txt"))?.len(), 0);
        assert_eq!(summary.results[0].bytes_written, Some(13));
        assert_eq!(reporter.events.len(), 2);
        Ok(())
    }

    #[test]
    fn test_writes_crlf_by_default() -> Result<()> {
        let root = tempdir()?;
        let mut reporter = MemoryReporter::default();
        let entries = [entry("a.txt", "one\ntwo\n")];

        materialize(&entries, root.path(), &MaterializeOptions::default(), &mut reporter)?;

        assert_eq!(fs::read(root.path().join("a.txt"))?, b"one\r\ntwo\r\n".to_vec());
        Ok(())
    }

    #[test]
    fn test_traversal_is_rejected_without_aborting_batch() -> Result<()> {
        let parent = tempdir()?;
        let root = parent.path().join("root");
        fs::create_dir(&root)?;
        let mut reporter = MemoryReporter::default();
        let entries = [
            entry("../escape.txt", "nope\n"),
            entry("inside.txt", "yes\n"),
        ];

        let summary = materialize(&entries, &root, &lf_options(), &mut reporter)?;

        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.succeeded(), 1);
        let failure = &summary.results[0];
        assert!(failure.reason.as_deref().unwrap().contains("path traversal"));
        assert!(failure.destination.is_none());
        assert!(!parent.path().join("escape.txt").exists());
        assert!(root.join("inside.txt").exists());
        assert!(matches!(
            reporter.events[0],
            StreamEvent::WriteFailed { .. }
        ));
        Ok(())
    }

    #[test]
    fn test_io_failure_is_recorded() -> Result<()> {
        let root = tempdir()?;
        // A file where a directory is needed makes directory creation fail.
        fs::write(root.path().join("blocker"), "x")?;
        let mut reporter = MemoryReporter::default();
        let entries = [entry("blocker/child.txt", "x\n"), entry("ok.txt", "ok\n")];

        let summary = materialize(&entries, root.path(), &lf_options(), &mut reporter)?;

        assert!(!summary.results[0].succeeded);
        assert!(summary.results[0].destination.is_some());
        assert!(summary.results[1].succeeded);
        Ok(())
    }

    #[test]
    fn test_dry_run_writes_nothing() -> Result<()> {
        let root = tempdir()?;
        let mut reporter = MemoryReporter::default();
        let options = MaterializeOptions {
            dry_run: true,
            ..Default::default()
        };
        let entries = [entry("nested/dir/file.txt", "a\nb\n")];

        let summary = materialize(&entries, root.path(), &options, &mut reporter)?;

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.results[0].bytes_written, Some(6));
        assert!(!root.path().join("nested").exists());
        assert!(matches!(
            reporter.events[0],
            StreamEvent::DryRun { bytes: 6, .. }
        ));
        Ok(())
    }

    #[test]
    fn test_backup_copies_existing_file() -> Result<()> {
        let root = tempdir()?;
        fs::write(root.path().join("cfg.ini"), "old\n")?;
        let mut reporter = MemoryReporter::default();
        let options = MaterializeOptions {
            backup: true,
            ..lf_options()
        };

        materialize(&[entry("cfg.ini", "new\n")], root.path(), &options, &mut reporter)?;

        assert_eq!(fs::read_to_string(root.path().join("cfg.ini"))?, "new\n");
        let backups: Vec<_> = fs::read_dir(root.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with("cfg.ini.bak."))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            fs::read_to_string(root.path().join(&backups[0]))?,
            "old\n"
        );
        assert!(matches!(reporter.events[0], StreamEvent::BackedUp { .. }));
        Ok(())
    }

    #[test]
    fn test_idempotent_without_backup() -> Result<()> {
        let root = tempdir()?;
        let entries = [entry("a/b.txt", "x\r\ny\n"), entry("c.txt", "z\n")];
        let mut reporter = MemoryReporter::default();

        materialize(&entries, root.path(), &lf_options(), &mut reporter)?;
        let first = fs::read(root.path().join("a/b.txt"))?;
        materialize(&entries, root.path(), &lf_options(), &mut reporter)?;

        assert_eq!(fs::read(root.path().join("a/b.txt"))?, first);
        assert_eq!(fs::read_dir(root.path())?.count(), 2);
        Ok(())
    }

    #[test]
    fn test_last_entry_wins_for_same_path() -> Result<()> {
        let root = tempdir()?;
        let mut reporter = MemoryReporter::default();
        let entries = [entry("dup.txt", "first\n"), entry("dup.txt", "second\n")];

        let summary = materialize(&entries, root.path(), &lf_options(), &mut reporter)?;

        assert_eq!(summary.succeeded(), 2);
        assert_eq!(fs::read_to_string(root.path().join("dup.txt"))?, "second\n");
        Ok(())
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let parent = tempdir().unwrap();
        let mut reporter = MemoryReporter::default();
        let result = materialize(
            &[entry("a.txt", "a\n")],
            &parent.path().join("absent"),
            &lf_options(),
            &mut reporter,
        );
        assert!(result.is_err());
    }
}
