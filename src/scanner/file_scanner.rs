//! Document discovery over a directory tree

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Instant;
use walkdir::{DirEntry, WalkDir};

use super::exclusion::ExclusionRules;
use super::progress::{ScanProgress, Throttle, PROGRESS_INTERVAL};
use crate::core::error::{Error, Result};
use crate::core::types::{extension_of, FileInfo, FileType, ProgressCallback};
use crate::core::validator::validate_file;
use crate::core::CancelToken;

/// Input to a single [`Scanner::scan`] call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    pub root_path: PathBuf,
    /// Categories to keep; empty keeps every known category
    #[serde(default)]
    pub include_types: Vec<FileType>,
    /// Extra substrings appended to the default exclusion list
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    #[serde(default)]
    pub validate_files: bool,
}

impl ScanOptions {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Default::default()
        }
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = FileType>) -> Self {
        self.include_types = types.into_iter().collect();
        self
    }

    pub fn with_excludes(mut self, excludes: impl IntoIterator<Item = String>) -> Self {
        self.exclude_paths = excludes.into_iter().collect();
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_files = validate;
        self
    }

    fn includes(&self, file_type: FileType) -> bool {
        self.include_types.is_empty() || self.include_types.contains(&file_type)
    }
}

/// Everything a completed scan found
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub files: Vec<FileInfo>,
    pub total_count: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// Elapsed wall-clock seconds
    pub scan_time: f64,
}

impl ScanResult {
    fn new(files: Vec<FileInfo>, scan_time: f64) -> Self {
        let valid_count = files.iter().filter(|f| f.is_valid).count();
        Self {
            total_count: files.len(),
            invalid_count: files.len() - valid_count,
            valid_count,
            files,
            scan_time,
        }
    }

    /// Number of files found per category, in [`FileType::ALL`] order.
    pub fn counts_by_type(&self) -> Vec<(FileType, usize)> {
        FileType::ALL
            .iter()
            .map(|&t| (t, self.files.iter().filter(|f| f.file_type == t).count()))
            .collect()
    }
}

/// Running counters for one walk.
struct WalkState {
    scanned_dirs: u64,
    found_files: u64,
    throttle: Throttle,
}

/// Recursive document scanner.
///
/// One instance can run any number of scans, one at a time. The latest
/// progress snapshot stays readable through [`Scanner::progress`] and is
/// pushed to the registered callback as it changes.
pub struct Scanner {
    progress: Mutex<ScanProgress>,
    callback: RwLock<Option<ProgressCallback<ScanProgress>>>,
    cancel: CancelToken,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            progress: Mutex::new(ScanProgress::default()),
            callback: RwLock::new(None),
            cancel: CancelToken::new(),
        }
    }

    /// Register the progress observer. It runs on the scanning thread and
    /// should return quickly.
    pub fn set_progress_callback<F>(&self, callback: F)
    where
        F: Fn(&ScanProgress) + Send + Sync + 'static,
    {
        let mut cb = self.callback.write().unwrap_or_else(PoisonError::into_inner);
        *cb = Some(Box::new(callback));
    }

    /// Latest progress snapshot.
    pub fn progress(&self) -> ScanProgress {
        self.progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Handle that stops a running scan when cancelled.
    ///
    /// The token stays set once cancelled, so a token cancelled before
    /// [`Scanner::scan`] starts stops it immediately. Call
    /// [`CancelToken::reset`] to reuse the scanner.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Walk `options.root_path` and collect every recognized document.
    ///
    /// Unreadable entries below the root are skipped. Failing to read the
    /// root itself is fatal, as is cancellation.
    pub fn scan(&self, options: &ScanOptions) -> Result<ScanResult> {
        let start = Instant::now();
        let rules = ExclusionRules::new(&options.exclude_paths);
        let mut state = WalkState {
            scanned_dirs: 0,
            found_files: 0,
            throttle: Throttle::new(PROGRESS_INTERVAL),
        };

        self.publish(ScanProgress {
            current_path: options.root_path.clone(),
            is_scanning: true,
            ..Default::default()
        });

        let walked = self.walk(options, &rules, &mut state);

        self.publish(ScanProgress {
            current_path: options.root_path.clone(),
            scanned_dirs: state.scanned_dirs,
            found_files: state.found_files,
            current_file: None,
            is_scanning: false,
        });

        let files = walked?;
        let result = ScanResult::new(files, start.elapsed().as_secs_f64());

        tracing::info!(
            "Scanned {} directories under {}: {} documents ({} valid, {} invalid) in {:.2}s",
            state.scanned_dirs,
            options.root_path.display(),
            result.total_count,
            result.valid_count,
            result.invalid_count,
            result.scan_time
        );

        Ok(result)
    }

    fn walk(
        &self,
        options: &ScanOptions,
        rules: &ExclusionRules,
        state: &mut WalkState,
    ) -> Result<Vec<FileInfo>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&options.root_path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !rules.is_excluded(e.path(), e.file_type().is_dir()));

        for entry in walker {
            if self.cancel.is_cancelled() {
                tracing::info!("Scan of {} cancelled", options.root_path.display());
                return Err(Error::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(Error::DirectoryAccess {
                        path: options.root_path.clone(),
                        source: err,
                    });
                }
                Err(err) => {
                    tracing::debug!("Skipping inaccessible entry: {}", err);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                state.scanned_dirs += 1;
                if state.throttle.ready() {
                    self.publish(ScanProgress {
                        current_path: entry.path().to_path_buf(),
                        scanned_dirs: state.scanned_dirs,
                        found_files: state.found_files,
                        current_file: None,
                        is_scanning: true,
                    });
                }
                continue;
            }

            let Some(info) = classify(&entry, options) else {
                continue;
            };

            state.found_files += 1;
            if state.throttle.ready() {
                self.publish(ScanProgress {
                    current_path: entry
                        .path()
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_default(),
                    scanned_dirs: state.scanned_dirs,
                    found_files: state.found_files,
                    current_file: Some(info.name.clone()),
                    is_scanning: true,
                });
            }
            files.push(info);
        }

        Ok(files)
    }

    fn publish(&self, snapshot: ScanProgress) {
        {
            let mut progress = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
            *progress = snapshot.clone();
        }

        let cb = self.callback.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = cb.as_ref() {
            callback(&snapshot);
        }
    }
}

/// Turn a non-directory entry into a [`FileInfo`], or `None` if it is not a
/// wanted document or cannot be read.
fn classify(entry: &DirEntry, options: &ScanOptions) -> Option<FileInfo> {
    let name = entry.file_name().to_string_lossy().into_owned();
    let extension = extension_of(&name)?;
    let file_type = FileType::from_extension(&extension)?;
    if !options.includes(file_type) {
        return None;
    }

    let metadata = if entry.path_is_symlink() {
        fs::metadata(entry.path())
    } else {
        entry.metadata().map_err(std::io::Error::from)
    };
    let metadata = match metadata {
        Ok(m) if m.is_file() => m,
        Ok(_) => return None,
        Err(err) => {
            tracing::debug!("Skipping {}: {}", entry.path().display(), err);
            return None;
        }
    };

    let mut info = FileInfo {
        path: entry.path().to_path_buf(),
        name,
        size: metadata.len(),
        mod_time: metadata.modified().ok().map(DateTime::<Utc>::from),
        extension,
        file_type,
        is_valid: true,
        invalid_reason: None,
    };

    if options.validate_files {
        if let Err(rejection) = validate_file(&info.path, file_type) {
            tracing::debug!("Invalid {}: {}", info.path.display(), rejection);
            info.is_valid = false;
            info.invalid_reason = Some(rejection.to_string());
        }
    }

    Some(info)
}
