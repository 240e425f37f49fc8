//! Integration tests for structural document validation
//!
//! Tests malformed and well-formed PDF, OOXML, OLE2 and CSV files to make
//! sure every defect is reported as a rejection and never as a panic.

use doc_radar_rs::prelude::*;
use std::fs::File;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Helper to create a test file with given content
fn create_test_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Helper to build an OLE2 header of `size` bytes with the given sector shift
fn ole2_file(size: usize, sector_shift: u16) -> NamedTempFile {
    let mut content = vec![0u8; size];
    content[..8].copy_from_slice(&OLE2_MAGIC);
    content[30..32].copy_from_slice(&sector_shift.to_le_bytes());
    create_test_file(&content)
}

fn minimal_pdf() -> Vec<u8> {
    b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n".to_vec()
}

/// Test that a minimal PDF with signature, object and EOF marker is valid
#[test]
fn test_minimal_pdf_is_valid() {
    let temp_file = create_test_file(&minimal_pdf());
    assert!(validate_file(temp_file.path(), FileType::Pdf).is_ok());
}

/// Test that breaking any one of the three PDF landmarks is rejected
#[test]
fn test_each_pdf_landmark_is_required() {
    let valid = minimal_pdf();
    let broken = vec![
        valid.iter().map(|&b| if b == b'%' { b'$' } else { b }).collect::<Vec<u8>>(), // header (and EOF)
        String::from_utf8(valid.clone()).unwrap().replace("%%EOF", "%%E0F").into_bytes(),
        String::from_utf8(valid.clone()).unwrap().replace("obj", "ojb").into_bytes(),
    ];

    for (idx, content) in broken.iter().enumerate() {
        let temp_file = create_test_file(content);
        let err = validate_file(temp_file.path(), FileType::Pdf)
            .expect_err(&format!("Test case {} should be invalid", idx));
        assert!(!err.to_string().is_empty(), "Test case {} should carry a reason", idx);
    }
}

/// Test PDF with corrupted header
#[test]
fn test_corrupted_header() {
    let test_cases = vec![
        b"PDF-1.7\n1 0 obj\n%%EOF".as_slice(),  // Missing %
        b"$PDF-1.7\n1 0 obj\n%%EOF".as_slice(), // Wrong character
        b"%pdf-1.7\n1 0 obj\n%%EOF".as_slice(), // Lowercase
        b"%PD-1.7\n1 0 obj\n%%EOF".as_slice(),  // Missing F
    ];

    for (idx, content) in test_cases.iter().enumerate() {
        let temp_file = create_test_file(content);
        let result = validate_file(temp_file.path(), FileType::Pdf);
        assert!(
            matches!(result, Err(Rejection::PdfHeader)),
            "Test case {} should be invalid (corrupted header)",
            idx
        );
    }
}

/// Test PDF with missing or corrupted EOF marker
#[test]
fn test_corrupted_eof_marker() {
    let test_cases = vec![
        b"%PDF-1.7\n1 0 obj\n%EOF".as_slice(),  // Single %
        b"%PDF-1.7\n1 0 obj\nEOF".as_slice(),   // Missing %%
        b"%PDF-1.7\n1 0 obj\n%%eof".as_slice(), // Lowercase
        b"%PDF-1.7\n1 0 obj\n".as_slice(),      // Completely missing
    ];

    for (idx, content) in test_cases.iter().enumerate() {
        let temp_file = create_test_file(content);
        let result = validate_file(temp_file.path(), FileType::Pdf);
        assert!(
            matches!(result, Err(Rejection::PdfMissingEof)),
            "Test case {} should be invalid (bad EOF marker)",
            idx
        );
    }
}

/// Test files below the minimum header size
#[test]
fn test_files_below_minimum_size() {
    let empty = create_test_file(b"");
    assert!(matches!(
        validate_file(empty.path(), FileType::Pdf),
        Err(Rejection::Empty)
    ));

    for content in [b"%".as_slice(), b"%P".as_slice(), b"%PD".as_slice()] {
        let temp_file = create_test_file(content);
        assert!(
            matches!(validate_file(temp_file.path(), FileType::Word), Err(Rejection::TooSmall)),
            "{} byte file should be too small",
            content.len()
        );
    }
}

/// Test that a missing file is a rejection, not a panic
#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = validate_file(&temp_dir.path().join("gone.docx"), FileType::Word);
    assert!(matches!(result, Err(Rejection::Open(_))));
}

/// Test that a real OOXML package written by a zip library is valid
#[test]
fn test_real_ooxml_package() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.docx");

    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    zip.start_file("[Content_Types].xml", SimpleFileOptions::default()).unwrap();
    zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
    zip.write_all(b"<w:document/>").unwrap();
    zip.finish().unwrap();

    assert!(validate_file(&path, FileType::Word).is_ok());
    // [Content_Types].xml is category-independent
    assert!(validate_file(&path, FileType::Excel).is_ok());
}

/// Test that a zip signature without any further zip structure is rejected
#[test]
fn test_bare_zip_signature() {
    let mut content = vec![0x50, 0x4B, 0x03, 0x04];
    content.extend(std::iter::repeat(0u8).take(100));
    let temp_file = create_test_file(&content);

    assert!(matches!(
        validate_file(temp_file.path(), FileType::Ppt),
        Err(Rejection::OoxmlStructure)
    ));
}

/// Test OLE2 sector size exponents
#[test]
fn test_ole2_sector_exponents() {
    for shift in [9u16, 12] {
        let temp_file = ole2_file(4096, shift);
        assert!(
            validate_file(temp_file.path(), FileType::Excel).is_ok(),
            "Sector shift {} should be accepted",
            shift
        );
    }

    for shift in [0u16, 8, 10, 11, 13, 0x0900] {
        let temp_file = ole2_file(4096, shift);
        assert!(
            matches!(validate_file(temp_file.path(), FileType::Word), Err(Rejection::Ole2SectorSize(s)) if s == shift),
            "Sector shift {} should be rejected",
            shift
        );
    }
}

/// Test that a truncated OLE2 file is rejected
#[test]
fn test_ole2_truncated() {
    let temp_file = ole2_file(512, 9);
    assert!(matches!(
        validate_file(temp_file.path(), FileType::Ppt),
        Err(Rejection::Ole2TooSmall(512))
    ));

    let temp_file = ole2_file(100, 9);
    assert!(matches!(
        validate_file(temp_file.path(), FileType::Ppt),
        Err(Rejection::Ole2HeaderRead)
    ));
}

/// Test CSV acceptance and the printable-ratio threshold
#[test]
fn test_csv_heuristic() {
    let csv = create_test_file(b"id;name;city\n1;Ana;Lisboa\n2;Bo;Oslo\n");
    assert!(validate_file(csv.path(), FileType::Excel).is_ok());

    // 85% printable: below the threshold
    let mut content = vec![b'a'; 85];
    content.extend(std::iter::repeat(0x01u8).take(15));
    let binary = create_test_file(&content);
    assert!(matches!(
        validate_file(binary.path(), FileType::Excel),
        Err(Rejection::OfficeHeader)
    ));

    // Text is never a valid PowerPoint
    assert!(matches!(
        validate_file(csv.path(), FileType::Ppt),
        Err(Rejection::OfficeHeader)
    ));
}

/// Test that a PDF renamed to .docx is caught
#[test]
fn test_mislabeled_document() {
    let temp_file = create_test_file(&minimal_pdf());
    assert!(matches!(
        validate_file(temp_file.path(), FileType::Word),
        Err(Rejection::OfficeHeader)
    ));
}
