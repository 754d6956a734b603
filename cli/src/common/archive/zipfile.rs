//! ZIP output for `common::archive`.
use super::ArchiveMember;
use crate::core::error::Result;
use anyhow::Context;
use chrono::{Datelike, Timelike};
use std::fs::File;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes `members` into a Deflate-compressed ZIP at `output`.
///
/// Every member gets the current local time as its modification time.
pub fn write_zip(output: &Path, members: &[ArchiveMember]) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create archive {:?}", output))?;
    let mut zip = ZipWriter::new(file);

    let now = chrono::Local::now();
    let options: FileOptions<'_, ()> = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644)
        .last_modified_time(
            zip::DateTime::from_date_and_time(
                now.year() as u16,
                now.month() as u8,
                now.day() as u8,
                now.hour() as u8,
                now.minute() as u8,
                now.second() as u8,
            )
            .unwrap_or_default(),
        );

    for member in members {
        zip.start_file(member.name.as_str(), options)
            .with_context(|| format!("Failed to start {} in ZIP", member.name))?;
        let mut source = File::open(&member.source)
            .with_context(|| format!("Failed to open {:?}", member.source))?;
        std::io::copy(&mut source, &mut zip)
            .with_context(|| format!("Failed to write {} to ZIP", member.name))?;
    }

    zip.finish().context("Failed to finalize ZIP file")?;
    Ok(())
}
