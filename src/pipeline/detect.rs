//! Format detection from the file name, plus container signature checks.
//!
//! The extension decides which extractor runs; the leading bytes decide
//! whether that extractor is even worth starting. A PDF with a mangled
//! header or a "docx" that is not a ZIP archive fails here with a precise
//! message instead of an opaque parser error.

use crate::error::Doc2MdError;
use crate::output::UploadedFile;
use serde::{Deserialize, Serialize};
use std::fmt;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// The document formats the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    Docx,
    Xlsx,
    Pptx,
    Pdf,
    Html,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 5] = [
        DocumentFormat::Docx,
        DocumentFormat::Xlsx,
        DocumentFormat::Pptx,
        DocumentFormat::Pdf,
        DocumentFormat::Html,
    ];

    /// Match a bare extension (no dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(DocumentFormat::Docx),
            "xlsx" => Some(DocumentFormat::Xlsx),
            "pptx" => Some(DocumentFormat::Pptx),
            "pdf" => Some(DocumentFormat::Pdf),
            "html" => Some(DocumentFormat::Html),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Docx => "docx",
            DocumentFormat::Xlsx => "xlsx",
            DocumentFormat::Pptx => "pptx",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Html => "html",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Xlsx => "XLSX",
            DocumentFormat::Pptx => "PPTX",
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Html => "HTML",
        }
    }

    /// Whether the parser for this format needs a seekable file on disk
    /// rather than an in-memory buffer.
    ///
    /// pdfium and calamine's auto-detecting opener both work from paths.
    pub fn needs_staging(self) -> bool {
        matches!(self, DocumentFormat::Pdf | DocumentFormat::Xlsx)
    }

    /// Suffix for staged scratch files, so extension-sniffing parsers agree.
    pub fn staging_suffix(self) -> String {
        format!(".{}", self.extension())
    }

    /// Check the leading bytes against the container this format uses.
    pub fn check_signature(self, name: &str, bytes: &[u8]) -> Result<(), Doc2MdError> {
        let expected = match self {
            DocumentFormat::Pdf => PDF_MAGIC,
            DocumentFormat::Docx | DocumentFormat::Xlsx | DocumentFormat::Pptx => ZIP_MAGIC,
            DocumentFormat::Html => return Ok(()),
        };
        if bytes.starts_with(expected) {
            Ok(())
        } else {
            Err(Doc2MdError::InvalidSignature {
                name: name.to_string(),
                format: self.label(),
                magic: bytes.iter().take(expected.len()).copied().collect(),
            })
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Determine the format of an uploaded file from its name.
///
/// Upstream callers are expected to filter by extension already; this is
/// the core's own guard.
pub fn detect(file: &UploadedFile) -> Result<DocumentFormat, Doc2MdError> {
    let extension = file.extension();
    extension
        .as_deref()
        .and_then(DocumentFormat::from_extension)
        .ok_or_else(|| Doc2MdError::UnsupportedFormat {
            name: file.name.clone(),
            extension,
        })
}
