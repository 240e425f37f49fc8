//! Scan progress snapshots and emission throttling

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Minimum spacing between intermediate progress snapshots.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Point-in-time view of a running scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    /// Directory being walked
    pub current_path: PathBuf,
    pub scanned_dirs: u64,
    pub found_files: u64,
    /// Last document found, if the snapshot was taken on a file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    pub is_scanning: bool,
}

/// Lets an event through at most once per interval.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Instant,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// True if more than `interval` has passed since the last time this
    /// returned true (or since creation).
    pub fn ready(&mut self) -> bool {
        if self.last.elapsed() > self.interval {
            self.last = Instant::now();
            true
        } else {
            false
        }
    }
}
