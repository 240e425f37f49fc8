//! Report writing functionality

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::error::{Error, Result};
use crate::exporter::ExportResult;
use crate::scanner::ScanResult;

/// Write a human-readable scan (and optional export) report
///
/// # Arguments
/// * `output_path` - Path to output file
/// * `scan` - Result of the scan
/// * `export` - Result of an export of (part of) the scanned files
pub fn write_report(output_path: &Path, scan: &ScanResult, export: Option<&ExportResult>) -> Result<()> {
    let file = File::create(output_path).map_err(|e| Error::file_write(output_path, e))?;
    let mut file = BufWriter::new(file);

    render_report(&mut file, scan, export)
        .and_then(|_| file.flush())
        .map_err(|e| Error::file_write(output_path, e))
}

fn render_report<W: Write>(file: &mut W, scan: &ScanResult, export: Option<&ExportResult>) -> std::io::Result<()> {
    writeln!(file, "Office Document Scan Report")?;
    writeln!(file, "===========================")?;
    writeln!(file, "Generated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file)?;

    writeln!(file, "Summary Statistics:")?;
    writeln!(file, "-------------------")?;
    writeln!(file, "  Total files found: {}", scan.total_count)?;
    writeln!(file, "  Valid files: {}", scan.valid_count)?;
    writeln!(file, "  Invalid files: {}", scan.invalid_count)?;
    for (file_type, count) in scan.counts_by_type() {
        writeln!(file, "  {} files: {}", file_type, count)?;
    }
    if scan.total_count > 0 {
        let valid_pct = (scan.valid_count as f64 / scan.total_count as f64) * 100.0;
        writeln!(file, "  Validation success rate: {:.2}%", valid_pct)?;
    }
    writeln!(file, "  Scan time: {:.2}s", scan.scan_time)?;
    writeln!(file)?;

    if scan.invalid_count > 0 {
        writeln!(file, "Invalid Files:")?;
        writeln!(file, "--------------")?;
        for info in scan.files.iter().filter(|f| !f.is_valid) {
            let reason = info.invalid_reason.as_deref().unwrap_or("unknown");
            writeln!(file, "  {} ({})", info.path.display(), reason)?;
        }
        writeln!(file)?;
    }

    if let Some(export) = export {
        writeln!(file, "Export:")?;
        writeln!(file, "-------")?;
        if let Some(archive) = &export.archive_path {
            writeln!(file, "  Archive: {}", archive.display())?;
        }
        writeln!(file, "  Exported: {}", export.success)?;
        writeln!(file, "  Skipped (already present): {}", export.skipped_files.len())?;
        writeln!(file, "  Failed: {}", export.failed)?;
        for path in &export.failed_files {
            writeln!(file, "    [FAILED] {}", path.display())?;
        }
        for path in &export.skipped_files {
            writeln!(file, "    [SKIP]   {}", path.display())?;
        }
        writeln!(file)?;
    }

    writeln!(file, "Valid Files:")?;
    writeln!(file, "------------")?;
    writeln!(file, "  Total: {}", scan.valid_count)?;
    writeln!(file)?;
    for info in scan.files.iter().filter(|f| f.is_valid) {
        writeln!(file, "  [{}] {}", info.file_type, info.path.display())?;
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    scan: &'a ScanResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<&'a ExportResult>,
}

/// Write scan (and optional export) results as pretty-printed JSON
pub fn write_json_report(output_path: &Path, scan: &ScanResult, export: Option<&ExportResult>) -> Result<()> {
    let file = File::create(output_path).map_err(|e| Error::file_write(output_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &JsonReport { scan, export })?;
    writer.flush().map_err(|e| Error::file_write(output_path, e))
}
