use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use doc_radar_rs::prelude::*;

#[derive(Parser)]
#[command(name = "doc_radar_rs")]
#[command(about = "Find, validate and export office documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Run in batch mode (no progress bar)
    #[arg(long, global = true)]
    batch: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory tree and report the documents found
    Scan {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Scan a directory tree, then copy or zip the documents found
    Export {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        export: ExportArgs,
        #[command(flatten)]
        report: ReportArgs,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Directory to scan
    root: PathBuf,

    /// Only keep these document types (comma separated)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    types: Vec<FileType>,

    /// Skip every path containing this substring (repeatable)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Verify file structure, not just the extension
    #[arg(long)]
    validate: bool,
}

#[derive(Args)]
struct ExportArgs {
    /// Destination directory
    #[arg(short, long)]
    dest: PathBuf,

    /// Pack everything into a single zip archive instead of copying
    #[arg(long)]
    zip: bool,

    /// Recreate the source directory layout under the destination
    #[arg(long)]
    keep_structure: bool,

    /// Replace files already present at the destination
    #[arg(long)]
    overwrite: bool,

    /// Only export files that pass validation (implies --validate)
    #[arg(long)]
    valid_only: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Write a text report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a JSON report to this file
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let scanner = Scanner::new();
    let exporter = Exporter::new();

    // Set up graceful shutdown handler
    let scan_cancel = scanner.cancel_token();
    let export_cancel = exporter.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!("\n⚠️  Shutdown requested. Finishing current files...");
        scan_cancel.cancel();
        export_cancel.cancel();
    })
    .context("Error setting Ctrl-C handler")?;

    match cli.command {
        Command::Scan { scan, report } => {
            let Some(result) = run_scan(&scanner, &scan, false, cli.batch)? else {
                return Ok(());
            };
            print_scan_summary(&result);
            write_reports(&report, &result, None)?;
        }
        Command::Export { scan, export, report } => {
            let Some(result) = run_scan(&scanner, &scan, export.valid_only, cli.batch)? else {
                return Ok(());
            };
            print_scan_summary(&result);

            let files: Vec<FileInfo> = result
                .files
                .iter()
                .filter(|f| !export.valid_only || f.is_valid)
                .cloned()
                .collect();
            if files.is_empty() {
                println!("Nothing to export.");
                write_reports(&report, &result, None)?;
                return Ok(());
            }

            let Some(outcome) = run_export(&exporter, &export, files, cli.batch)? else {
                return Ok(());
            };
            print_export_summary(&outcome);
            write_reports(&report, &result, Some(&outcome))?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "doc_radar_rs=debug" } else { "doc_radar_rs=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the scan behind a spinner. `None` means the user interrupted it.
fn run_scan(scanner: &Scanner, args: &ScanArgs, force_validate: bool, batch: bool) -> Result<Option<ScanResult>> {
    let options = ScanOptions::new(&args.root)
        .with_types(args.types.iter().copied())
        .with_excludes(args.exclude.iter().cloned())
        .with_validation(args.validate || force_validate);

    let spinner = if batch {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let pb = spinner.clone();
    scanner.set_progress_callback(move |p| {
        pb.set_message(format!(
            "{} dirs, {} documents | {}",
            p.scanned_dirs,
            p.found_files,
            p.current_path.display()
        ));
    });

    println!("Scanning {}", args.root.display());
    match scanner.scan(&options) {
        Ok(result) => {
            spinner.finish_and_clear();
            Ok(Some(result))
        }
        Err(Error::Cancelled) => {
            spinner.finish_and_clear();
            eprintln!("⏹️  Scan cancelled");
            Ok(None)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e).with_context(|| format!("Failed to scan {}", args.root.display()))
        }
    }
}

/// Run the copy or zip export behind a progress bar. `None` means the user
/// interrupted it.
fn run_export(
    exporter: &Exporter,
    args: &ExportArgs,
    files: Vec<FileInfo>,
    batch: bool,
) -> Result<Option<ExportResult>> {
    let total = files.len();
    let options = ExportOptions::new(&args.dest, files)
        .keep_structure(args.keep_structure)
        .overwrite(args.overwrite);

    let progress = if batch {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("#>-"),
        );
        pb
    };

    let pb = progress.clone();
    exporter.set_progress_callback(move |p| {
        pb.set_position(p.completed as u64);
        pb.set_message(p.current.clone());
    });

    let outcome = if args.zip {
        exporter.export_as_zip(&options)
    } else {
        exporter.export(&options)
    };

    match outcome {
        Ok(result) => {
            progress.finish_with_message("Export complete!");
            Ok(Some(result))
        }
        Err(Error::Cancelled) => {
            progress.finish_and_clear();
            let p = exporter.progress();
            eprintln!("\n⏹️  Export cancelled");
            eprintln!("📊 Processed {}/{} files ({:.1}%)", p.completed, p.total, p.percent);
            Ok(None)
        }
        Err(e) => {
            progress.finish_and_clear();
            Err(e).with_context(|| format!("Failed to export to {}", args.dest.display()))
        }
    }
}

fn print_scan_summary(result: &ScanResult) {
    println!("==================================================");
    println!("SCAN COMPLETE ({:.2}s)", result.scan_time);
    println!("==================================================");
    for (file_type, count) in result.counts_by_type() {
        println!("{:>6} files: {}", file_type, count);
    }
    println!("Total documents: {}", result.total_count);
    println!("Valid: {}", result.valid_count);
    println!("Invalid: {}", result.invalid_count);
    println!();
}

fn print_export_summary(result: &ExportResult) {
    if let Some(archive) = &result.archive_path {
        println!("📦 Archive written to: {}", archive.display());
    }
    println!("Exported: {} ({} skipped)", result.success, result.skipped_files.len());
    println!("Failed: {}", result.failed);
    for path in &result.failed_files {
        eprintln!("  failed: {}", path.display());
    }
    println!();
}

fn write_reports(args: &ReportArgs, scan: &ScanResult, export: Option<&ExportResult>) -> Result<()> {
    if let Some(path) = &args.output {
        write_report(path, scan, export)?;
        println!("Detailed report saved to: {:?}", path);
    }
    if let Some(path) = &args.json {
        write_json_report(path, scan, export)?;
        println!("JSON report saved to: {:?}", path);
    }
    Ok(())
}
