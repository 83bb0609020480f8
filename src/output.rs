//! Data carried into and out of a batch.
//!
//! [`UploadedFile`] goes in; one [`BatchEntry`] per file comes out, holding
//! the file, its [`ConversionResult`] and, for successes only, a
//! [`SizeReport`]. Nothing here is persisted; every value lives for one
//! request.

use crate::error::FileError;
use crate::pipeline::report;
use serde::{Deserialize, Serialize};

/// A file submitted for conversion. Identity is its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Original file name, e.g. `report.docx`.
    pub name: String,
    /// Raw bytes as received.
    #[serde(skip)]
    pub content: Vec<u8>,
    /// Size reported by whoever received the upload, in bytes.
    pub declared_size: u64,
}

impl UploadedFile {
    /// Create a file whose declared size is the length of `content`.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            declared_size: content.len() as u64,
            content,
        }
    }

    /// Override the declared size (uploads report it separately from the body).
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = size;
        self
    }

    /// Lower-cased extension without the dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Name with its last extension removed: `report.docx` → `report`.
    pub fn base_name(&self) -> &str {
        let path = std::path::Path::new(&self.name);
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or(&self.name);
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if path.extension().is_some() => stem,
            _ => file_name,
        }
    }
}

/// Outcome of converting one file. `error` is `Some` iff it failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Name of the source file.
    pub file_name: String,
    /// Converted Markdown/plain text. Empty on failure.
    pub content: String,
    /// Wall-clock time spent on this file.
    pub duration_ms: u64,
    /// Failure detail, present only when conversion failed.
    pub error: Option<FileError>,
}

impl ConversionResult {
    pub fn succeeded(file_name: impl Into<String>, content: String, duration_ms: u64) -> Self {
        Self {
            file_name: file_name.into(),
            content,
            duration_ms,
            error: None,
        }
    }

    pub fn failed(file_name: impl Into<String>, error: FileError, duration_ms: u64) -> Self {
        Self {
            file_name: file_name.into(),
            content: String::new(),
            duration_ms,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Byte sizes before and after conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeReport {
    /// Declared size of the uploaded file.
    pub original_bytes: u64,
    /// UTF-8 byte length of the converted text.
    pub converted_bytes: u64,
    /// `(original - converted) / original * 100`; negative when the text is
    /// larger, `0` when the original is empty.
    pub reduction_percent: f64,
}

impl SizeReport {
    pub fn new(original_bytes: u64, converted: &str) -> Self {
        report::report(original_bytes, converted)
    }

    pub fn original_kb(&self) -> f64 {
        self.original_bytes as f64 / 1024.0
    }

    pub fn converted_kb(&self) -> f64 {
        self.converted_bytes as f64 / 1024.0
    }
}

/// Which downloadable form of the converted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Markdown,
    PlainText,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Markdown, ArtifactKind::PlainText];

    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Markdown => "_converted.md",
            ArtifactKind::PlainText => "_converted.txt",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ArtifactKind::Markdown => "text/markdown",
            ArtifactKind::PlainText => "text/plain",
        }
    }
}

/// A named, typed download derived from a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub media_type: &'static str,
    pub content: String,
}

/// One row of a batch result: the file, its result, and its size report.
///
/// Built only through [`BatchEntry::converted`] and [`BatchEntry::failed`],
/// so `report` is present exactly when `result` succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub file: UploadedFile,
    pub result: ConversionResult,
    pub report: Option<SizeReport>,
}

impl BatchEntry {
    pub fn converted(file: UploadedFile, content: String, duration_ms: u64) -> Self {
        let report = SizeReport::new(file.declared_size, &content);
        let result = ConversionResult::succeeded(file.name.clone(), content, duration_ms);
        Self {
            file,
            result,
            report: Some(report),
        }
    }

    pub fn failed(file: UploadedFile, error: FileError, duration_ms: u64) -> Self {
        let result = ConversionResult::failed(file.name.clone(), error, duration_ms);
        Self {
            file,
            result,
            report: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<Artifact> {
        if !self.is_success() {
            return None;
        }
        Some(Artifact {
            kind,
            file_name: format!("{}{}", self.file.base_name(), kind.suffix()),
            media_type: kind.media_type(),
            content: self.result.content.clone(),
        })
    }

    /// The `.md` and `.txt` downloads; empty for a failed file.
    pub fn artifacts(&self) -> Vec<Artifact> {
        ArtifactKind::ALL
            .iter()
            .filter_map(|&k| self.artifact(k))
            .collect()
    }
}

/// Aggregate numbers for a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub converted_files: usize,
    pub failed_files: usize,
    /// Sum of declared sizes of converted files only.
    pub total_original_bytes: u64,
    pub total_converted_bytes: u64,
    pub duration_ms: u64,
}

impl BatchStats {
    pub fn from_entries(entries: &[BatchEntry], duration_ms: u64) -> Self {
        let reports = entries.iter().filter_map(|e| e.report.as_ref());
        let (original, converted) = reports.fold((0u64, 0u64), |(o, c), r| {
            (o + r.original_bytes, c + r.converted_bytes)
        });
        let converted_files = entries.iter().filter(|e| e.is_success()).count();
        Self {
            total_files: entries.len(),
            converted_files,
            failed_files: entries.len() - converted_files,
            total_original_bytes: original,
            total_converted_bytes: converted,
            duration_ms,
        }
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        report::reduction_percent(self.total_original_bytes, self.total_converted_bytes)
    }
}

/// Everything a batch produced, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    pub entries: Vec<BatchEntry>,
    pub stats: BatchStats,
}
