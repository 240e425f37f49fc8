//! Sequential zip export

use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;
use std::time::SystemTime;
use zip::result::{ZipError, ZipResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::paths::to_entry_name;
use super::{ExportOptions, ExportProgress, ExportResult, Exporter};
use crate::core::error::{Error, Result};

/// `office-files-YYYYMMDD-HHMMSS.zip` for the given moment.
pub fn archive_file_name(at: DateTime<Local>) -> String {
    format!("office-files-{}.zip", at.format("%Y%m%d-%H%M%S"))
}

impl Exporter {
    /// Write `options.files` into one deflate archive under
    /// `options.dest_path`.
    ///
    /// Entries are added one at a time; a file that cannot be added is
    /// counted as failed and the rest still go in, so the archive may end
    /// up partial. The final progress snapshot is always 100%.
    pub fn export_as_zip(&self, options: &ExportOptions) -> Result<ExportResult> {
        fs::create_dir_all(&options.dest_path).map_err(|source| Error::DestinationCreate {
            path: options.dest_path.clone(),
            source,
        })?;

        let archive_path = options.dest_path.join(archive_file_name(Local::now()));
        let archive_file = File::create(&archive_path).map_err(|source| Error::ArchiveCreate {
            path: archive_path.clone(),
            source,
        })?;
        self.warn_shadowed_roots(options);

        let mut zip = ZipWriter::new(BufWriter::new(archive_file));
        let total = options.files.len();
        let mut result = ExportResult {
            archive_path: Some(archive_path.clone()),
            ..Default::default()
        };
        self.publish(|| ExportProgress::new(total, 0, 0, ""));

        let mut cancelled = false;
        for (i, file) in options.files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let failed = result.failed;
            self.publish(|| ExportProgress::new(total, i, failed, file.name.as_str()));

            let entry_name = to_entry_name(&self.relative_path(options, file));
            match add_file(&mut zip, &file.path, &entry_name) {
                Ok(()) => result.success += 1,
                Err(err) => {
                    tracing::warn!("Failed to archive {}: {}", file.path.display(), err);
                    result.failed += 1;
                    result.failed_files.push(file.path.clone());
                }
            }

            let failed = result.failed;
            self.publish(|| ExportProgress::new(total, i + 1, failed, file.name.as_str()));
        }

        let finished = zip
            .finish()
            .and_then(|mut writer| writer.flush().map_err(ZipError::from));
        if let Err(source) = finished {
            return Err(Error::Archive {
                path: archive_path,
                source,
            });
        }

        if cancelled {
            tracing::info!(
                "Archive {} cancelled after {}/{} files",
                archive_path.display(),
                result.success + result.failed,
                total
            );
            return Err(Error::Cancelled);
        }

        let current = self.progress().current;
        let failed = result.failed;
        self.publish(|| ExportProgress {
            total,
            completed: total,
            failed,
            current,
            percent: 100.0,
        });

        tracing::info!(
            "Archived {} files into {} ({} failed)",
            result.success,
            archive_path.display(),
            result.failed
        );

        Ok(result)
    }
}

/// Add one file as a deflate entry. Nothing is left in the archive when
/// this fails.
fn add_file<W: Write + Seek>(zip: &mut ZipWriter<W>, src: &Path, entry_name: &str) -> ZipResult<()> {
    let mut source = File::open(src)?;
    let metadata = source.metadata()?;

    let mut options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(metadata.len() >= u32::MAX as u64);
    if let Some(modified) = metadata.modified().ok().and_then(zip_timestamp) {
        options = options.last_modified_time(modified);
    }

    zip.start_file(entry_name, options)?;
    if let Err(err) = io::copy(&mut source, zip) {
        if let Err(abort_err) = zip.abort_file() {
            tracing::warn!("Failed to discard partial entry {}: {}", entry_name, abort_err);
        }
        return Err(err.into());
    }

    Ok(())
}

/// Zip timestamps are local, second/2 resolution, 1980..=2107.
fn zip_timestamp(time: SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = time.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}
