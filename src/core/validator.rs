//! Structural document validation
//!
//! Checks that a file is what its extension claims by looking at magic
//! numbers and a few container landmarks. Reads at most two small windows of
//! each file; never parses document content.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use thiserror::Error;

use super::types::FileType;

/// `%PDF`
pub const PDF_MAGIC: [u8; 4] = [0x25, 0x50, 0x44, 0x46];
/// Zip local file header, the container of OOXML documents
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
/// OLE2 compound document signature
pub const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const HEADER_LEN: u64 = 8;
const MIN_HEADER_LEN: usize = 4;

const PDF_TAIL_WINDOW: u64 = 1024;
const PDF_HEAD_WINDOW: u64 = 4096;

const OOXML_SAMPLE_LEN: u64 = 8192;
const CONTENT_TYPES_PART: &[u8] = b"[Content_Types].xml";

const OLE2_HEADER_LEN: usize = 512;
const OLE2_SECTOR_SHIFT_OFFSET: usize = 30;
/// Header sector plus the minimum FAT and directory sectors.
const OLE2_MIN_SIZE: u64 = 1536;

const CSV_SAMPLE_LEN: u64 = 4096;
const CSV_PRINTABLE_RATIO: f64 = 0.9;

/// Why a file was judged not to be a genuine document.
///
/// The `Display` text is what ends up in `FileInfo::invalid_reason`.
#[derive(Error, Debug)]
pub enum Rejection {
    #[error("cannot open file: {0}")]
    Open(#[source] io::Error),

    #[error("cannot read file metadata: {0}")]
    Metadata(#[source] io::Error),

    #[error("file is empty")]
    Empty,

    #[error("cannot read file header: {0}")]
    HeaderRead(#[source] io::Error),

    #[error("file is too small to verify")]
    TooSmall,

    #[error("not a valid PDF file (header mismatch)")]
    PdfHeader,

    #[error("cannot read file tail: {0}")]
    TailRead(#[source] io::Error),

    #[error("PDF may be corrupted (missing %%EOF marker)")]
    PdfMissingEof,

    #[error("PDF structure anomaly (no object definitions)")]
    PdfMissingObject,

    #[error("cannot read file content: {0}")]
    ContentRead(#[source] io::Error),

    #[error("Office file structure anomaly (no OOXML parts found)")]
    OoxmlStructure,

    #[error("cannot read OLE2 header")]
    Ole2HeaderRead,

    #[error("OLE2 sector size exponent {0} is invalid")]
    Ole2SectorSize(u16),

    #[error("OLE2 file too small: {0} bytes")]
    Ole2TooSmall(u64),

    #[error("not a valid Office file (header mismatch)")]
    OfficeHeader,
}

/// Verify that `path` is structurally a `file_type` document.
///
/// I/O failures are reported as a [`Rejection`] like any other defect, so
/// callers can treat the result as a plain verdict.
pub fn validate_file(path: &Path, file_type: FileType) -> Result<(), Rejection> {
    let mut file = File::open(path).map_err(Rejection::Open)?;
    let size = file.metadata().map_err(Rejection::Metadata)?.len();
    if size == 0 {
        return Err(Rejection::Empty);
    }

    let header = read_up_to(&mut file, HEADER_LEN).map_err(Rejection::HeaderRead)?;
    if header.len() < MIN_HEADER_LEN {
        return Err(Rejection::TooSmall);
    }

    file_type.verify(&mut file, &header, size)
}

impl FileType {
    fn verify(self, file: &mut File, header: &[u8], size: u64) -> Result<(), Rejection> {
        match self {
            FileType::Pdf => verify_pdf(file, header, size),
            FileType::Word | FileType::Excel | FileType::Ppt => {
                verify_office(self, file, header, size)
            }
        }
    }

    /// Part names that show up in the first entries of a genuine OOXML package.
    fn ooxml_markers(self) -> &'static [&'static [u8]] {
        match self {
            FileType::Word => &[b"word/", b"document.xml"],
            FileType::Excel => &[b"xl/", b"workbook.xml", b"sheet"],
            FileType::Ppt => &[b"ppt/", b"presentation.xml", b"slide"],
            FileType::Pdf => &[],
        }
    }

    /// Only the spreadsheet category covers a plain-text format (CSV).
    fn accepts_plain_text(self) -> bool {
        matches!(self, FileType::Excel)
    }
}

fn verify_pdf(file: &mut File, header: &[u8], size: u64) -> Result<(), Rejection> {
    if !header.starts_with(&PDF_MAGIC) {
        return Err(Rejection::PdfHeader);
    }

    let tail_size = size.min(PDF_TAIL_WINDOW);
    file.seek(SeekFrom::End(-(tail_size as i64)))
        .map_err(Rejection::TailRead)?;
    let mut tail = vec![0u8; tail_size as usize];
    file.read_exact(&mut tail).map_err(Rejection::TailRead)?;

    if !contains(&tail, b"%%EOF") {
        return Err(Rejection::PdfMissingEof);
    }

    let head = read_from_start(file, PDF_HEAD_WINDOW).map_err(Rejection::ContentRead)?;
    if !contains(&head, b"obj") {
        return Err(Rejection::PdfMissingObject);
    }

    Ok(())
}

fn verify_office(
    file_type: FileType,
    file: &mut File,
    header: &[u8],
    size: u64,
) -> Result<(), Rejection> {
    if header.starts_with(&ZIP_MAGIC) {
        return verify_ooxml(file_type, file);
    }

    if header.starts_with(&OLE2_MAGIC) {
        return verify_ole2(file, size);
    }

    if file_type.accepts_plain_text() {
        let sample = read_from_start(file, CSV_SAMPLE_LEN).map_err(Rejection::ContentRead)?;
        if is_mostly_text(&sample) {
            return Ok(());
        }
    }

    Err(Rejection::OfficeHeader)
}

fn verify_ooxml(file_type: FileType, file: &mut File) -> Result<(), Rejection> {
    let sample = read_from_start(file, OOXML_SAMPLE_LEN).map_err(Rejection::ContentRead)?;

    if contains(&sample, CONTENT_TYPES_PART)
        || file_type
            .ooxml_markers()
            .iter()
            .any(|marker| contains(&sample, marker))
    {
        return Ok(());
    }

    // Encrypted or unusually ordered packages may keep their part names past
    // the sample; another zip header is accepted as a weak signal.
    let after_signature = sample.get(ZIP_MAGIC.len()..).unwrap_or(&[]);
    if contains(after_signature, b"PK") {
        return Ok(());
    }

    Err(Rejection::OoxmlStructure)
}

fn verify_ole2(file: &mut File, size: u64) -> Result<(), Rejection> {
    let header = read_from_start(file, OLE2_HEADER_LEN as u64)
        .map_err(|_| Rejection::Ole2HeaderRead)?;
    if header.len() < OLE2_HEADER_LEN {
        return Err(Rejection::Ole2HeaderRead);
    }

    let sector_shift = u16::from_le_bytes([
        header[OLE2_SECTOR_SHIFT_OFFSET],
        header[OLE2_SECTOR_SHIFT_OFFSET + 1],
    ]);
    // 2^9 = 512 (v3), 2^12 = 4096 (v4)
    if sector_shift != 9 && sector_shift != 12 {
        return Err(Rejection::Ole2SectorSize(sector_shift));
    }

    if size < OLE2_MIN_SIZE {
        return Err(Rejection::Ole2TooSmall(size));
    }

    Ok(())
}

/// Printable-ratio test for CSV-like content.
///
/// Bytes >= 0x80 count as text without decoding, so any UTF-8 (and a fair
/// amount of binary) passes; this is a heuristic, not a CSV parser.
pub(crate) fn is_mostly_text(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }

    let printable = sample
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b) || matches!(b, b'\t' | b'\r' | b'\n') || b >= 0x80)
        .count();

    printable as f64 / sample.len() as f64 > CSV_PRINTABLE_RATIO
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn read_from_start(file: &mut File, limit: u64) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    read_up_to(file, limit)
}

fn read_up_to(file: &mut File, limit: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(limit as usize);
    file.by_ref().take(limit).read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(content: &[u8]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_minimal_pdf_is_valid() {
        let f = temp_with(b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n");
        assert!(validate_file(f.path(), FileType::Pdf).is_ok());
    }

    #[test]
    fn test_eof_marker_must_be_in_tail() {
        let mut content = b"%PDF-1.4\n1 0 obj\n%%EOF\n".to_vec();
        content.extend(std::iter::repeat(b' ').take(2048));
        let f = temp_with(&content);
        assert!(matches!(
            validate_file(f.path(), FileType::Pdf),
            Err(Rejection::PdfMissingEof)
        ));
    }

    #[test]
    fn test_obj_token_must_be_in_head() {
        let mut content = b"%PDF-1.4\n".to_vec();
        content.extend(std::iter::repeat(b' ').take(5000));
        content.extend_from_slice(b"1 0 obj\n%%EOF");
        let f = temp_with(&content);
        assert!(matches!(
            validate_file(f.path(), FileType::Pdf),
            Err(Rejection::PdfMissingObject)
        ));
    }

    #[test]
    fn test_header_shorter_than_four_bytes() {
        let f = temp_with(b"%PD");
        assert!(matches!(
            validate_file(f.path(), FileType::Pdf),
            Err(Rejection::TooSmall)
        ));
    }

    #[test]
    fn test_ole2_sector_shift() {
        let mut content = vec![0u8; 2048];
        content[..8].copy_from_slice(&OLE2_MAGIC);
        content[30] = 9;
        let f = temp_with(&content);
        assert!(validate_file(f.path(), FileType::Word).is_ok());

        content[30] = 12;
        let f = temp_with(&content);
        assert!(validate_file(f.path(), FileType::Excel).is_ok());

        content[30] = 10;
        let f = temp_with(&content);
        assert!(matches!(
            validate_file(f.path(), FileType::Ppt),
            Err(Rejection::Ole2SectorSize(10))
        ));
    }

    #[test]
    fn test_ole2_minimum_size() {
        let mut content = vec![0u8; 1024];
        content[..8].copy_from_slice(&OLE2_MAGIC);
        content[30] = 9;
        let f = temp_with(&content);
        assert!(matches!(
            validate_file(f.path(), FileType::Word),
            Err(Rejection::Ole2TooSmall(1024))
        ));

        let f = temp_with(&content[..300]);
        assert!(matches!(
            validate_file(f.path(), FileType::Word),
            Err(Rejection::Ole2HeaderRead)
        ));
    }

    #[test]
    fn test_ooxml_markers_by_category() {
        let mut content = ZIP_MAGIC.to_vec();
        content.extend_from_slice(b"\x14\x00\x00\x00xl/workbook.xml");
        let f = temp_with(&content);
        assert!(validate_file(f.path(), FileType::Excel).is_ok());
        assert!(matches!(
            validate_file(f.path(), FileType::Word),
            Err(Rejection::OoxmlStructure)
        ));
    }

    #[test]
    fn test_ooxml_repeated_zip_header_is_accepted() {
        let mut content = ZIP_MAGIC.to_vec();
        content.extend_from_slice(b"\x14\x00encrypted\x00PK\x01\x02");
        let f = temp_with(&content);
        assert!(validate_file(f.path(), FileType::Ppt).is_ok());
    }

    #[test]
    fn test_csv_only_for_excel() {
        let f = temp_with(b"name,amount\nalice,10\nbob,20\n");
        assert!(validate_file(f.path(), FileType::Excel).is_ok());
        assert!(matches!(
            validate_file(f.path(), FileType::Word),
            Err(Rejection::OfficeHeader)
        ));
    }

    #[test]
    fn test_is_mostly_text() {
        assert!(is_mostly_text(b"a,b,c\r\n1,2,3\r\n"));
        assert!(is_mostly_text("名前,金額\n".as_bytes()));
        assert!(!is_mostly_text(&[0u8, 1, 2, 3, 4, 5, b'a', b'b']));
        assert!(!is_mostly_text(b""));
    }

    #[test]
    fn test_rejection_reasons_are_descriptive() {
        assert_eq!(Rejection::Empty.to_string(), "file is empty");
        assert!(Rejection::Ole2SectorSize(7).to_string().contains('7'));
    }
}
