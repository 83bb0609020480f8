//! Error types for the edgequake-doc2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2MdError`] — **Detailed**: every concrete way a step can fail,
//!   with the file name, path or URL and the underlying cause attached.
//!   Returned as `Err(Doc2MdError)` from engine calls, staging, input
//!   resolution and configuration.
//!
//! * [`FileError`] — **Non-fatal**: one file of a batch failed. Stored inside
//!   [`crate::output::ConversionResult`] so a single corrupt upload never
//!   aborts the rest of the batch.
//!
//! The orchestrator folds each `Doc2MdError` into a `FileError` at the file
//! boundary; the detailed text survives in [`FileError::detail`] for logs
//! while end users get [`FileError::user_message`].

use std::path::PathBuf;
use thiserror::Error;

/// All detailed errors returned by the edgequake-doc2md library.
///
/// Per-file failures inside a batch are recorded as [`FileError`] rather
/// than propagated.
#[derive(Debug, Error)]
pub enum Doc2MdError {
    // ── Storage errors ────────────────────────────────────────────────────
    /// Scratch file could not be created or written.
    #[error("Failed to stage '{name}' in scratch storage: {source}")]
    StagingFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Scratch file could not be removed.
    #[error("Failed to remove scratch file '{path}': {source}")]
    ReleaseFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Format errors ─────────────────────────────────────────────────────
    /// Extension absent or not one of docx, xlsx, pptx, pdf, html.
    #[error("Unsupported format for '{name}': {}", describe_extension(.extension))]
    UnsupportedFormat {
        name: String,
        extension: Option<String>,
    },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// Leading bytes do not match the container the extension promises.
    #[error("'{name}' is not a valid {format} file\nFirst bytes: {magic:?}")]
    InvalidSignature {
        name: String,
        format: &'static str,
        magic: Vec<u8>,
    },

    /// The container opened but a required part is missing or damaged.
    #[error("'{name}' is corrupt: {detail}")]
    CorruptDocument { name: String, detail: String },

    /// Text content is not valid UTF-8.
    #[error("'{name}' has an unsupported text encoding: {detail}")]
    InvalidEncoding { name: String, detail: String },

    /// The format parser rejected the document.
    #[error("Failed to parse {format} document '{name}': {detail}")]
    ParseFailed {
        name: String,
        format: &'static str,
        detail: String,
    },

    /// A remote resource could not be fetched.
    #[error("Failed to fetch '{url}': {reason}\nCheck your internet connection.")]
    FetchFailed { url: String, reason: String },

    /// A remote resource did not answer within the configured timeout.
    #[error("Fetching '{url}' timed out after {secs}s\nIncrease --timeout.")]
    FetchTimeout { url: String, secs: u64 },

    /// Conversion exceeded the optional per-file time cap.
    #[error("Conversion of '{name}' timed out after {secs}s")]
    ConversionTimeout { name: String, secs: u64 },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF conversion needs the PDFium shared library. You can:\n\
  • Install libpdfium system-wide.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write a converted artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_extension(extension: &Option<String>) -> String {
    match extension {
        Some(ext) => format!("'.{ext}' is not one of .docx, .xlsx, .pptx, .pdf, .html"),
        None => "file name has no extension".to_string(),
    }
}

/// Coarse classification used when folding a [`Doc2MdError`] into a [`FileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Storage,
    Conversion,
    UnsupportedFormat,
    /// Not specific to a single file (bad config, unreadable input path, …).
    Fatal,
}

impl Doc2MdError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Doc2MdError::StagingFailed { .. } | Doc2MdError::ReleaseFailed { .. } => {
                ErrorCategory::Storage
            }
            Doc2MdError::UnsupportedFormat { .. } => ErrorCategory::UnsupportedFormat,
            Doc2MdError::InvalidSignature { .. }
            | Doc2MdError::CorruptDocument { .. }
            | Doc2MdError::InvalidEncoding { .. }
            | Doc2MdError::ParseFailed { .. }
            | Doc2MdError::FetchFailed { .. }
            | Doc2MdError::FetchTimeout { .. }
            | Doc2MdError::ConversionTimeout { .. }
            | Doc2MdError::PdfiumBindingFailed(_) => ErrorCategory::Conversion,
            Doc2MdError::FileNotFound { .. }
            | Doc2MdError::PermissionDenied { .. }
            | Doc2MdError::InvalidInput { .. }
            | Doc2MdError::OutputWriteFailed { .. }
            | Doc2MdError::InvalidConfig(_)
            | Doc2MdError::Internal(_) => ErrorCategory::Fatal,
        }
    }

    /// Fold into the per-file record for `file`, keeping the full message
    /// (including `#[source]` causes) as the detail.
    pub fn into_file_error(self, file: &str) -> FileError {
        let detail = error_chain(&self);
        let file = file.to_string();
        match self.category() {
            ErrorCategory::Storage => FileError::Storage { file, detail },
            ErrorCategory::UnsupportedFormat => FileError::UnsupportedFormat { file, detail },
            // Anything else that reaches a file boundary means this file
            // could not be converted.
            ErrorCategory::Conversion | ErrorCategory::Fatal => {
                FileError::Conversion { file, detail }
            }
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !msg.contains(&cause_msg) {
            msg.push_str(": ");
            msg.push_str(&cause_msg);
        }
        source = cause.source();
    }
    msg
}

/// A non-fatal error for a single file of a batch.
///
/// Stored alongside [`crate::output::ConversionResult`] when a file fails.
/// The batch always continues with the next file.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// Scratch storage could not be created or removed.
    #[error("{file}: scratch storage failed: {detail}")]
    Storage { file: String, detail: String },

    /// The document could not be converted.
    #[error("{file}: conversion failed: {detail}")]
    Conversion { file: String, detail: String },

    /// The file's extension is absent or not accepted.
    #[error("{file}: unsupported format: {detail}")]
    UnsupportedFormat { file: String, detail: String },
}

impl FileError {
    pub fn file(&self) -> &str {
        match self {
            FileError::Storage { file, .. }
            | FileError::Conversion { file, .. }
            | FileError::UnsupportedFormat { file, .. } => file,
        }
    }

    /// The retained low-level cause, for logs and diagnostics.
    pub fn detail(&self) -> &str {
        match self {
            FileError::Storage { detail, .. }
            | FileError::Conversion { detail, .. }
            | FileError::UnsupportedFormat { detail, .. } => detail,
        }
    }

    /// Generic explanation suitable for end users.
    pub fn user_message(&self) -> String {
        format!("Could not read {}. Please check the format.", self.file())
    }
}
