//! Timestamped copies of files about to be overwritten.
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Copies `destination` to `<destination>.bak.<YYYYmmdd-HHMMSS>` if it exists.
///
/// Returns the backup path, or `None` when there was nothing to back up. Two
/// backups of the same file within one second share a name; the later copy wins.
pub fn backup_existing(destination: &Path) -> io::Result<Option<PathBuf>> {
    if !destination.is_file() {
        return Ok(None);
    }
    let backup = backup_path_for(destination, Local::now());
    fs::copy(destination, &backup)?;
    info!("Backed up {:?} to {:?}", destination, backup);
    Ok(Some(backup))
}

fn backup_path_for(destination: &Path, now: DateTime<Local>) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(format!(".bak.{}", now.format("%Y%m%d-%H%M%S")));
    PathBuf::from(name)
}
