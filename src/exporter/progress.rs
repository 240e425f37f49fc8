//! Export progress snapshots

use serde::{Deserialize, Serialize};

/// Point-in-time view of a running export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProgress {
    pub total: usize,
    /// Files processed so far, failed and skipped included
    pub completed: usize,
    pub failed: usize,
    /// Name of the file most recently touched
    pub current: String,
    pub percent: f64,
}

impl ExportProgress {
    pub fn new(total: usize, completed: usize, failed: usize, current: impl Into<String>) -> Self {
        Self {
            total,
            completed,
            failed,
            current: current.into(),
            percent: percent_of(completed, total),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// `completed / total * 100`, capped at 100. An empty batch is complete.
pub fn percent_of(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (completed as f64 / total as f64 * 100.0).min(100.0)
}
