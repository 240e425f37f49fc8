//! Directory walking, exclusion and scan progress

pub mod exclusion;
pub mod file_scanner;
pub mod progress;

pub use exclusion::{ExclusionRules, DEFAULT_EXCLUDE_PATHS, WINDOWS_SYSTEM_DIRS};
pub use file_scanner::{ScanOptions, ScanResult, Scanner};
pub use progress::ScanProgress;
