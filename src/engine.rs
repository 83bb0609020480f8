//! The conversion engine seam.
//!
//! [`ConversionEngine`] is the one contract the orchestrator depends on: give
//! it a document (in memory or staged on disk) and its format, get Markdown
//! back or a [`Doc2MdError`]. [`MarkdownEngine`] is the built-in
//! implementation; tests and embedders can inject their own through
//! `Arc<dyn ConversionEngine>`.

use crate::config::EngineConfig;
use crate::error::Doc2MdError;
use crate::output::UploadedFile;
use crate::pipeline::detect::DocumentFormat;
use crate::pipeline::extract::{docx, html, pdf, pptx, xlsx};
use crate::pipeline::{input, postprocess};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a document is handed to an engine.
#[derive(Debug, Clone, Copy)]
pub enum EngineInput<'a> {
    /// The raw upload, for parsers that read from memory.
    Bytes { name: &'a str, data: &'a [u8] },
    /// A staged scratch file, for parsers that need a path.
    Staged { name: &'a str, path: &'a Path },
}

impl EngineInput<'_> {
    pub fn name(&self) -> &str {
        match self {
            EngineInput::Bytes { name, .. } | EngineInput::Staged { name, .. } => name,
        }
    }
}

#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Whether `format` must be staged before [`convert`](Self::convert).
    fn needs_staging(&self, format: DocumentFormat) -> bool {
        format.needs_staging()
    }

    async fn convert(
        &self,
        input: EngineInput<'_>,
        format: DocumentFormat,
    ) -> Result<String, Doc2MdError>;
}

/// Built-in engine: native parsers per format plus a shared HTTP client.
///
/// Build once per process; the client and its settings are reused by every
/// fetch.
#[derive(Debug, Clone)]
pub struct MarkdownEngine {
    client: reqwest::Client,
    timeout_secs: u64,
    pdfium_library_path: Option<PathBuf>,
}

impl MarkdownEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, Doc2MdError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Doc2MdError::InvalidConfig(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Doc2MdError::InvalidConfig(format!("header '{name}' value: {e}")))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(input::timeout(config.timeout_secs))
            .build()
            .map_err(|e| Doc2MdError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
            pdfium_library_path: config.pdfium_library_path.clone(),
        })
    }

    /// Download `url` into an [`UploadedFile`].
    pub async fn fetch(&self, url: &str) -> Result<UploadedFile, Doc2MdError> {
        input::fetch(&self.client, url, self.timeout_secs).await
    }

    /// Resolve a CLI argument: URLs are fetched, anything else is read from disk.
    pub async fn resolve(&self, input: &str) -> Result<UploadedFile, Doc2MdError> {
        if input::is_url(input) {
            self.fetch(input).await
        } else {
            input::read_local(input).await
        }
    }
}

enum Source {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

#[async_trait]
impl ConversionEngine for MarkdownEngine {
    fn name(&self) -> &str {
        "markdown"
    }

    async fn convert(
        &self,
        input: EngineInput<'_>,
        format: DocumentFormat,
    ) -> Result<String, Doc2MdError> {
        let name = input.name().to_string();
        let source = match input {
            EngineInput::Bytes { data, .. } => Source::Bytes(data.to_vec()),
            EngineInput::Staged { path, .. } => Source::Path(path.to_path_buf()),
        };
        let library = self.pdfium_library_path.clone();

        debug!("Converting '{}' as {}", name, format);
        let task_name = name.clone();
        let raw = tokio::task::spawn_blocking(move || {
            extract_blocking(&task_name, format, source, library.as_deref())
        })
        .await
        .map_err(|e| {
            Doc2MdError::Internal(format!("Conversion task for '{name}' panicked: {e}"))
        })??;

        Ok(postprocess::clean_text(&raw))
    }
}

/// Signature check, then the format's extractor. Runs on the blocking pool.
fn extract_blocking(
    name: &str,
    format: DocumentFormat,
    source: Source,
    library: Option<&Path>,
) -> Result<String, Doc2MdError> {
    match source {
        Source::Bytes(data) => {
            format.check_signature(name, &data)?;
            match format {
                DocumentFormat::Docx => docx::extract(name, &data),
                DocumentFormat::Pptx => pptx::extract(name, &data),
                DocumentFormat::Html => html::extract(name, &data),
                DocumentFormat::Xlsx | DocumentFormat::Pdf => Err(Doc2MdError::Internal(format!(
                    "{format} document '{name}' must be staged before conversion"
                ))),
            }
        }
        Source::Path(path) => {
            format.check_signature(name, &read_head(name, &path)?)?;
            match format {
                DocumentFormat::Xlsx => xlsx::extract(name, &path),
                DocumentFormat::Pdf => pdf::extract(name, &path, library),
                DocumentFormat::Docx | DocumentFormat::Pptx | DocumentFormat::Html => {
                    let data = std::fs::read(&path).map_err(|e| Doc2MdError::CorruptDocument {
                        name: name.to_string(),
                        detail: format!("cannot read staged copy: {e}"),
                    })?;
                    extract_blocking(name, format, Source::Bytes(data), library)
                }
            }
        }
    }
}

/// First few bytes of a staged file, enough for a signature check.
fn read_head(name: &str, path: &Path) -> Result<Vec<u8>, Doc2MdError> {
    let mut head = Vec::with_capacity(8);
    std::fs::File::open(path)
        .and_then(|f| f.take(8).read_to_end(&mut head))
        .map_err(|e| Doc2MdError::CorruptDocument {
            name: name.to_string(),
            detail: format!("cannot read staged copy: {e}"),
        })?;
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn engine() -> MarkdownEngine {
        MarkdownEngine::new(&EngineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn html_bytes_are_cleaned() {
        let md = engine()
            .convert(
                EngineInput::Bytes {
                    name: "a.html",
                    data: b"<p>one</p>\r\n<p>two</p>",
                },
                DocumentFormat::Html,
            )
            .await
            .unwrap();
        assert!(md.ends_with('\n') && !md.ends_with("\n\n"));
        assert!(!md.contains('\r'));
        assert!(md.contains("one") && md.contains("two"));
    }

    #[tokio::test]
    async fn bad_pdf_header_rejected_before_pdfium() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"\x00\x01not a pdf").unwrap();
        // Bogus library path: reaching pdfium would yield a binding error instead.
        let config = EngineConfig::builder()
            .pdfium_library_path(dir.path().join("libpdfium-missing.so"))
            .build()
            .unwrap();
        let err = MarkdownEngine::new(&config)
            .unwrap()
            .convert(
                EngineInput::Staged {
                    name: "broken.pdf",
                    path: &path,
                },
                DocumentFormat::Pdf,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2MdError::InvalidSignature { format: "PDF", .. }), "{err:?}");
    }

    #[tokio::test]
    async fn docx_that_is_not_zip_is_conversion_error() {
        let err = engine()
            .convert(
                EngineInput::Bytes {
                    name: "fake.docx",
                    data: b"hello",
                },
                DocumentFormat::Docx,
            )
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Conversion);
    }

    #[tokio::test]
    async fn pdf_bytes_must_be_staged() {
        let err = engine()
            .convert(
                EngineInput::Bytes {
                    name: "a.pdf",
                    data: b"%PDF-1.4",
                },
                DocumentFormat::Pdf,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2MdError::Internal(_)));
    }

    #[tokio::test]
    async fn staged_html_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, b"<p>from disk</p>").unwrap();
        let md = engine()
            .convert(
                EngineInput::Staged {
                    name: "page.html",
                    path: &path,
                },
                DocumentFormat::Html,
            )
            .await
            .unwrap();
        assert_eq!(md, "from disk\n");
    }

    #[test]
    fn default_staging_policy_follows_format() {
        let e = engine();
        assert!(e.needs_staging(DocumentFormat::Pdf));
        assert!(!e.needs_staging(DocumentFormat::Html));
        assert_eq!(ConversionEngine::name(&e), "markdown");
    }
}
