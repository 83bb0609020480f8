//! PDF → text via pdfium's text layer.
//!
//! pdfium is a blocking C++ library that only opens documents from disk,
//! so this extractor takes a staged path and must be called from
//! `spawn_blocking`. Scanned PDFs without a text layer yield empty pages.

use crate::error::Doc2MdError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind pdfium: explicit `library` path, then `PDFIUM_LIB_PATH`, then the
/// platform's system library.
pub fn bind(library: Option<&Path>) -> Result<Pdfium, Doc2MdError> {
    let from_env = std::env::var_os(PDFIUM_LIB_ENV).map(std::path::PathBuf::from);
    let bindings = match library.map(Path::to_path_buf).or(from_env) {
        Some(path) => Pdfium::bind_to_library(&path).map_err(|e| {
            Doc2MdError::PdfiumBindingFailed(format!("{}: {}", path.display(), e))
        })?,
        None => Pdfium::bind_to_system_library()
            .map_err(|e| Doc2MdError::PdfiumBindingFailed(e.to_string()))?,
    };
    Ok(Pdfium::new(bindings))
}

/// Extract the text of every page, pages separated by a blank line.
pub fn extract(name: &str, path: &Path, library: Option<&Path>) -> Result<String, Doc2MdError> {
    let pdfium = bind(library)?;

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| match e {
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                Doc2MdError::ParseFailed {
                    name: name.to_string(),
                    format: "PDF",
                    detail: "document is password protected".into(),
                }
            }
            other => Doc2MdError::CorruptDocument {
                name: name.to_string(),
                detail: format!("{other:?}"),
            },
        })?;

    let pages = document.pages();
    debug!("PDF '{}' loaded: {} pages", name, pages.len());

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (i, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| Doc2MdError::ParseFailed {
            name: name.to_string(),
            format: "PDF",
            detail: format!("page {}: {e:?}", i + 1),
        })?;
        let text = text.all();
        if text.trim().is_empty() {
            warn!("PDF '{}' page {} has no text layer", name, i + 1);
            continue;
        }
        texts.push(text.trim().to_string());
    }

    Ok(texts.join("\n\n"))
}
