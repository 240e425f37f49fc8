//! Office Document Radar Library
//!
//! Finds PDF, Word, Excel and PowerPoint documents under a directory tree,
//! checks that they are structurally what their extension claims, and
//! copies or zips a selection of them.

pub mod core;
pub mod exporter;
pub mod reporting;
pub mod scanner;

pub use crate::core::error::{Error, Result};
pub use crate::core::validator;
pub use crate::reporting::report_writer;
pub use crate::scanner::file_scanner;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::core::validator::{validate_file, Rejection};
    pub use crate::core::{CancelToken, Error, FileInfo, FileType, Result};
    pub use crate::exporter::{ExportOptions, ExportProgress, ExportResult, Exporter};
    pub use crate::reporting::report_writer::{write_json_report, write_report};
    pub use crate::scanner::{ScanOptions, ScanProgress, ScanResult, Scanner};
}
