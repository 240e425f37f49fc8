//! Concurrent copy export

use crossbeam_channel::{self as channel, select};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ExportOptions, ExportProgress, ExportResult, Exporter};
use crate::core::error::{Error, Result};
use crate::core::types::FileInfo;

/// Copy workers running at once.
pub const WORKER_COUNT: usize = 4;

/// Capacity of the job and outcome queues. Bounds memory regardless of how
/// many files are exported.
const QUEUE_CAPACITY: usize = 64;

/// What happened to one file.
#[derive(Debug)]
enum Outcome {
    Copied(PathBuf),
    Skipped(PathBuf),
    Failed(PathBuf),
}

impl ExportResult {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Copied(_) => self.success += 1,
            Outcome::Skipped(path) => {
                self.success += 1;
                self.skipped_files.push(path);
            }
            Outcome::Failed(path) => {
                self.failed += 1;
                self.failed_files.push(path);
            }
        }
    }

    fn processed(&self) -> usize {
        self.success + self.failed
    }
}

impl Exporter {
    /// Copy `options.files` into `options.dest_path` using a pool of
    /// [`WORKER_COUNT`] workers.
    ///
    /// Only failing to create the destination root (or the pool) is fatal;
    /// per-file errors land in [`ExportResult::failed_files`].
    pub fn export(&self, options: &ExportOptions) -> Result<ExportResult> {
        fs::create_dir_all(&options.dest_path).map_err(|source| Error::DestinationCreate {
            path: options.dest_path.clone(),
            source,
        })?;
        self.warn_shadowed_roots(options);

        let total = options.files.len();
        self.publish(|| ExportProgress::new(total, 0, 0, ""));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(WORKER_COUNT)
            .thread_name(|i| format!("export-worker-{}", i))
            .build()?;

        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let (job_tx, job_rx) = channel::bounded::<&FileInfo>(QUEUE_CAPACITY);
        let (outcome_tx, outcome_rx) = channel::bounded::<Outcome>(QUEUE_CAPACITY);
        let mut result = ExportResult::default();

        pool.in_place_scope(|scope| {
            for _ in 0..WORKER_COUNT {
                let job_rx = job_rx.clone();
                let outcome_tx = outcome_tx.clone();
                let (completed, failed) = (&completed, &failed);

                scope.spawn(move |_| {
                    for file in job_rx.iter() {
                        if self.cancel.is_cancelled() {
                            break;
                        }

                        let outcome = self.copy_one(options, file);
                        if matches!(outcome, Outcome::Failed(_)) {
                            failed.fetch_add(1, Ordering::SeqCst);
                        }
                        completed.fetch_add(1, Ordering::SeqCst);

                        self.publish(|| {
                            ExportProgress::new(
                                total,
                                completed.load(Ordering::SeqCst),
                                failed.load(Ordering::SeqCst),
                                file.name.as_str(),
                            )
                        });

                        if outcome_tx.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(outcome_tx);

            // Feed jobs and drain outcomes together so neither bounded queue
            // can stall the other.
            let mut pending = options.files.iter();
            let mut next = pending.next();
            while let Some(file) = next {
                if self.cancel.is_cancelled() {
                    break;
                }
                select! {
                    send(job_tx, file) -> sent => {
                        if sent.is_err() {
                            break;
                        }
                        next = pending.next();
                    }
                    recv(outcome_rx) -> outcome => match outcome {
                        Ok(outcome) => result.record(outcome),
                        Err(_) => break,
                    },
                }
            }
            drop(job_tx);

            for outcome in outcome_rx.iter() {
                result.record(outcome);
            }
        });

        if result.processed() < total && self.cancel.is_cancelled() {
            tracing::info!(
                "Export to {} cancelled after {}/{} files",
                options.dest_path.display(),
                result.processed(),
                total
            );
            return Err(Error::Cancelled);
        }

        tracing::info!(
            "Exported {} files to {} ({} skipped, {} failed)",
            result.success,
            options.dest_path.display(),
            result.skipped_files.len(),
            result.failed
        );

        Ok(result)
    }

    fn copy_one(&self, options: &ExportOptions, file: &FileInfo) -> Outcome {
        let dest = options.dest_path.join(self.relative_path(options, file));

        if !options.overwrite && dest.exists() {
            tracing::debug!("Skipping {}: {} exists", file.path.display(), dest.display());
            return Outcome::Skipped(file.path.clone());
        }

        if is_same_file(&file.path, &dest) {
            tracing::debug!("Skipping {}: destination is the source itself", file.path.display());
            return Outcome::Skipped(file.path.clone());
        }

        match copy_file(&file.path, &dest) {
            Ok(bytes) => {
                tracing::debug!("Copied {} ({} bytes)", file.path.display(), bytes);
                Outcome::Copied(file.path.clone())
            }
            Err(err) => {
                tracing::warn!("Failed to copy {} to {}: {}", file.path.display(), dest.display(), err);
                Outcome::Failed(file.path.clone())
            }
        }
    }
}

/// Copy `src` to `dst`, creating parent directories, and sync to disk.
///
/// Refuses to copy a file onto itself, which would truncate it.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    if is_same_file(src, dst) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is the source file", dst.display()),
        ));
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut source = File::open(src)?;
    let mut target = File::create(dst)?;
    let bytes = io::copy(&mut source, &mut target)?;
    target.sync_all()?;

    Ok(bytes)
}

/// True if both paths resolve to the same existing file. A destination that
/// does not exist yet never matches.
fn is_same_file(src: &Path, dst: &Path) -> bool {
    match (fs::canonicalize(src), fs::canonicalize(dst)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
