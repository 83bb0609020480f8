//! Pipeline stages for document-to-Markdown conversion.
//!
//! Each submodule implements exactly one step a file goes through.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ detect ──▶ staging ──▶ extract ──▶ postprocess ──▶ report
//! (path/URL) (format)   (scratch)   (parsers)    (cleanup)      (sizes)
//! ```
//!
//! 1. [`input`]   — turn a local path or URL into an [`UploadedFile`](crate::output::UploadedFile)
//! 2. [`detect`]  — pick the [`DocumentFormat`](detect::DocumentFormat) from the
//!    extension and check the container signature
//! 3. [`staging`] — copy the bytes to a scratch file for path-based parsers;
//!    the handle removes it on release or drop
//! 4. [`extract`] — per-format extractors; blocking, run in `spawn_blocking`
//! 5. [`postprocess`] — deterministic text-cleanup rules
//! 6. [`report`]  — byte-size comparison between upload and output

pub mod detect;
pub mod extract;
pub mod input;
pub mod postprocess;
pub mod report;
pub mod staging;
