//! Path exclusion rules applied while walking

use std::path::Path;

/// Substrings that prune any path containing them.
pub const DEFAULT_EXCLUDE_PATHS: &[&str] = &[
    // macOS
    "Library/Containers",
    "Library/Caches",
    "Library/Application Support",
    // VCS and dependency caches
    "node_modules",
    ".git",
    ".svn",
    // Windows
    "$RECYCLE.BIN",
    "System Volume Information",
];

/// Directory names pruned only when they sit directly under a drive root.
pub const WINDOWS_SYSTEM_DIRS: &[&str] = &["Windows", "Program Files", "Program Files (x86)", "ProgramData"];

/// Longest parent path still considered a drive root (`C:\`).
const DRIVE_ROOT_MAX_LEN: usize = 3;

/// Default exclusion substrings plus the caller's own.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    patterns: Vec<String>,
}

impl ExclusionRules {
    /// Build the rule set. Empty caller patterns are dropped since they
    /// would match every path.
    pub fn new(extra: &[String]) -> Self {
        let patterns = DEFAULT_EXCLUDE_PATHS
            .iter()
            .map(|p| p.to_string())
            .chain(extra.iter().filter(|p| !p.is_empty()).cloned())
            .collect();
        Self { patterns }
    }

    pub fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");
        if self.patterns.iter().any(|p| normalized.contains(p.as_str())) {
            return true;
        }

        is_dir && is_root_system_dir(path)
    }
}

fn is_root_system_dir(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy();

    if !WINDOWS_SYSTEM_DIRS.iter().any(|d| d.eq_ignore_ascii_case(&name)) {
        return false;
    }

    path.parent()
        .map(|parent| parent.as_os_str().len() <= DRIVE_ROOT_MAX_LEN)
        .unwrap_or(false)
}
