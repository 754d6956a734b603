//! Write-time containment check for destinations.
//!
//! The destination usually does not exist yet, so it cannot be canonicalized
//! directly. Instead the relative path is joined lexically, the deepest ancestor
//! that does exist is canonicalized (following any symlinks), and the missing
//! tail is appended again. The result must stay under the canonical root.
//! A component that exists but does not resolve, such as a dangling symlink,
//! is rejected rather than treated as missing.
use crate::core::error::StreamError;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::trace;

/// Resolves `relative` under `canonical_root`.
///
/// `canonical_root` must already be canonical.
///
/// # Errors
///
/// Returns `StreamError::PathTraversal` if the path is absolute, climbs above
/// the root, or reaches outside it through a symlink.
pub fn resolve_under_root(canonical_root: &Path, relative: &str) -> Result<PathBuf, StreamError> {
    let traversal = || StreamError::PathTraversal {
        path: relative.to_string(),
    };

    let mut lexical = canonical_root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => lexical.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            Component::RootDir | Component::Prefix(_) => return Err(traversal()),
        }
    }
    if !lexical.starts_with(canonical_root) || lexical == canonical_root {
        return Err(traversal());
    }

    let resolved = canonicalize_existing_prefix(&lexical).map_err(|_| traversal())?;
    trace!("Resolved '{}' to {}", relative, resolved.display());
    if resolved.starts_with(canonical_root) && resolved != canonical_root {
        Ok(resolved)
    } else {
        Err(traversal())
    }
}

/// Canonicalizes the deepest existing ancestor of `path` and re-appends the
/// missing tail.
///
/// A component only counts as missing when `symlink_metadata` reports
/// `NotFound`. Anything that exists but cannot be canonicalized (a dangling
/// symlink, a loop) is an error.
fn canonicalize_existing_prefix(path: &Path) -> io::Result<PathBuf> {
    let mut missing: Vec<OsString> = Vec::new();
    let mut existing = path;
    loop {
        match existing.canonicalize() {
            Ok(mut canonical) => {
                canonical.extend(missing.iter().rev());
                return Ok(canonical);
            }
            Err(err) => {
                match fs::symlink_metadata(existing) {
                    Err(meta_err) if meta_err.kind() == io::ErrorKind::NotFound => {}
                    Err(meta_err) => return Err(meta_err),
                    Ok(meta) => {
                        trace!(
                            "{} exists (symlink: {}) but cannot be resolved: {}",
                            existing.display(),
                            meta.file_type().is_symlink(),
                            err
                        );
                        return Err(err);
                    }
                }
                let (Some(name), Some(parent)) = (existing.file_name(), existing.parent()) else {
                    return Err(err);
                };
                missing.push(name.to_os_string());
                existing = parent;
            }
        }
    }
}
