//! # edgequake-doc2md
//!
//! Convert batches of Office documents, PDFs and HTML pages to Markdown and
//! plain text, with a size report per file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! UploadedFile
//!  │
//!  ├─ 1. Detect   format from the extension, container signature check
//!  ├─ 2. Stage    scratch copy for path-based parsers (PDF, XLSX)
//!  ├─ 3. Convert  per-format extractor (spawn_blocking) + cleanup rules
//!  ├─ 4. Release  scratch copy removed on every exit path
//!  └─ 5. Report   original vs converted bytes, reduction percentage
//! ```
//!
//! One file failing never affects the others: each [`BatchEntry`] carries
//! either the converted text and its [`SizeReport`], or a [`FileError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2md::{process_batch, ConversionEngine, EngineConfig, MarkdownEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let engine = MarkdownEngine::new(&config)?;
//!     let files = vec![
//!         engine.resolve("report.docx").await?,
//!         engine.resolve("https://example.org/notes.html").await?,
//!     ];
//!     let engine: Arc<dyn ConversionEngine> = Arc::new(engine);
//!     let output = process_batch(files, &engine, &config).await;
//!     for entry in &output.entries {
//!         match (&entry.report, &entry.result.error) {
//!             (Some(r), _) => println!("{}: {:.1}% smaller", entry.file.name, r.reduction_percent),
//!             (None, Some(e)) => eprintln!("{}", e.user_message()),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-doc2md = { version = "0.1", default-features = false }
//! ```
//!
//! ## Supported Formats
//!
//! | Extension | Parser | Staged |
//! |-----------|--------|--------|
//! | `.docx`   | zip + quick-xml | no |
//! | `.pptx`   | zip + quick-xml | no |
//! | `.xlsx`   | calamine        | yes |
//! | `.pdf`    | pdfium          | yes |
//! | `.html`   | html2md         | no |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EngineConfig, EngineConfigBuilder};
pub use convert::{process_batch, process_batch_sync, process_file, write_artifacts};
pub use engine::{ConversionEngine, EngineInput, MarkdownEngine};
pub use error::{Doc2MdError, ErrorCategory, FileError};
pub use output::{
    Artifact, ArtifactKind, BatchEntry, BatchOutput, BatchStats, ConversionResult, SizeReport,
    UploadedFile,
};
pub use pipeline::detect::DocumentFormat;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{process_batch_stream, EntryStream};
