//! Document categories and the per-file record produced by a scan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

lazy_static::lazy_static! {
    /// Extension (lowercased, with dot) to category.
    static ref EXTENSION_MAP: HashMap<&'static str, FileType> = {
        let mut m = HashMap::new();
        m.insert(".pdf", FileType::Pdf);

        for ext in [".doc", ".docx", ".docm", ".dot", ".dotx"] {
            m.insert(ext, FileType::Word);
        }
        for ext in [".xls", ".xlsx", ".xlsm", ".xlsb", ".xlt", ".xltx", ".csv"] {
            m.insert(ext, FileType::Excel);
        }
        for ext in [".ppt", ".pptx", ".pptm", ".pot", ".potx", ".pps", ".ppsx"] {
            m.insert(ext, FileType::Ppt);
        }
        m
    };
}

/// Observer invoked with each progress snapshot a scan or export emits.
pub type ProgressCallback<P> = Box<dyn Fn(&P) + Send + Sync>;

/// Category a recognized document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Word,
    Excel,
    Ppt,
}

impl FileType {
    pub const ALL: [FileType; 4] = [FileType::Pdf, FileType::Word, FileType::Excel, FileType::Ppt];

    /// Look up the category for a lowercased extension such as `.docx`.
    pub fn from_extension(ext: &str) -> Option<FileType> {
        EXTENSION_MAP.get(ext).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Word => "word",
            FileType::Excel => "excel",
            FileType::Ppt => "ppt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(FileType::Pdf),
            "word" => Ok(FileType::Word),
            "excel" => Ok(FileType::Excel),
            "ppt" => Ok(FileType::Ppt),
            other => Err(format!("unknown file type: {}", other)),
        }
    }
}

/// Lowercased extension of a file name, from its last dot onwards.
///
/// A name consisting of only an extension (`.pdf`) still has one.
pub fn extension_of(name: &str) -> Option<String> {
    name.rfind('.').map(|idx| name[idx..].to_lowercase())
}

/// A document discovered by the scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_time: Option<DateTime<Utc>>,
    pub extension: String,
    pub file_type: FileType,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(FileType::from_extension(".pdf"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension(".dotx"), Some(FileType::Word));
        assert_eq!(FileType::from_extension(".csv"), Some(FileType::Excel));
        assert_eq!(FileType::from_extension(".ppsx"), Some(FileType::Ppt));
        assert_eq!(FileType::from_extension(".txt"), None);
        assert_eq!(FileType::from_extension("pdf"), None);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Report.PDF").as_deref(), Some(".pdf"));
        assert_eq!(extension_of("archive.tar.XLSX").as_deref(), Some(".xlsx"));
        assert_eq!(extension_of(".pdf").as_deref(), Some(".pdf"));
        assert_eq!(extension_of("Makefile"), None);
    }

    #[test]
    fn test_file_type_serde_and_parse() {
        assert_eq!(serde_json::to_string(&FileType::Excel).unwrap(), "\"excel\"");
        assert_eq!("PPT".parse::<FileType>().unwrap(), FileType::Ppt);
        assert!("spreadsheet".parse::<FileType>().is_err());
    }
}
