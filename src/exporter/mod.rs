//! Copying or archiving a selection of scanned documents

pub mod archive;
pub mod copy;
pub mod paths;
pub mod progress;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use crate::core::types::{FileInfo, ProgressCallback};
use crate::core::CancelToken;

pub use archive::archive_file_name;
pub use paths::known_roots;
pub use progress::ExportProgress;

/// Input to one export call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub dest_path: PathBuf,
    pub files: Vec<FileInfo>,
    /// Recreate the source directory layout under `dest_path`
    #[serde(default)]
    pub keep_structure: bool,
    /// Replace files already present at the destination
    #[serde(default)]
    pub overwrite: bool,
}

impl ExportOptions {
    pub fn new(dest_path: impl Into<PathBuf>, files: Vec<FileInfo>) -> Self {
        Self {
            dest_path: dest_path.into(),
            files,
            ..Default::default()
        }
    }

    pub fn keep_structure(mut self, keep: bool) -> Self {
        self.keep_structure = keep;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Tallies of a finished export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    /// Files exported, skipped files included
    pub success: usize,
    pub failed: usize,
    pub failed_files: Vec<PathBuf>,
    pub skipped_files: Vec<PathBuf>,
    /// Archive written by zip mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<PathBuf>,
}

/// Copies or zips documents, keeping one live progress snapshot.
pub struct Exporter {
    progress: RwLock<ExportProgress>,
    callback: RwLock<Option<ProgressCallback<ExportProgress>>>,
    cancel: CancelToken,
    roots: Vec<PathBuf>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter {
    /// Exporter stripping the platform's [`known_roots`] in structure mode.
    pub fn new() -> Self {
        Self::with_roots(known_roots())
    }

    /// Exporter stripping the given roots, tried in order.
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self {
            progress: RwLock::new(ExportProgress::default()),
            callback: RwLock::new(None),
            cancel: CancelToken::new(),
            roots,
        }
    }

    /// Register the progress observer. In copy mode it is called from the
    /// worker threads.
    pub fn set_progress_callback<F>(&self, callback: F)
    where
        F: Fn(&ExportProgress) + Send + Sync + 'static,
    {
        let mut cb = self.callback.write().unwrap_or_else(PoisonError::into_inner);
        *cb = Some(Box::new(callback));
    }

    /// Latest progress snapshot.
    pub fn progress(&self) -> ExportProgress {
        self.progress
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Handle that stops a running export when cancelled.
    ///
    /// The token stays set once cancelled: later exports on this instance
    /// return [`Error::Cancelled`](crate::Error::Cancelled) until
    /// [`CancelToken::reset`] is called.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Replace the live snapshot with one built under the write lock, then
    /// notify the observer.
    fn publish(&self, build: impl FnOnce() -> ExportProgress) {
        let snapshot = {
            let mut progress = self.progress.write().unwrap_or_else(PoisonError::into_inner);
            *progress = build();
            progress.clone()
        };

        let cb = self.callback.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = cb.as_ref() {
            callback(&snapshot);
        }
    }

    /// Path of `file` relative to the destination: the root-stripped
    /// source path when keeping structure, else the bare file name.
    fn relative_path(&self, options: &ExportOptions, file: &FileInfo) -> String {
        if options.keep_structure {
            paths::relative_to_roots(&file.path, &self.roots)
        } else {
            file.name.clone()
        }
    }

    fn warn_shadowed_roots(&self, options: &ExportOptions) {
        if !options.keep_structure {
            return;
        }
        for (earlier, later) in paths::shadowed_roots(&self.roots) {
            tracing::warn!(
                "Root {} is listed before the more specific {}; files under {} keep the longer relative path",
                earlier.display(),
                later.display(),
                later.display()
            );
        }
    }
}
