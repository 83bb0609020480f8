//! Input resolution: turn a user-supplied path or URL into an upload.
//!
//! The orchestrator works on in-memory [`UploadedFile`]s, the same shape a
//! browser upload arrives in. Local files are read whole; URLs are fetched
//! with the engine's shared HTTP client so the configured user agent,
//! headers and timeout apply.

use crate::error::Doc2MdError;
use crate::output::UploadedFile;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Name given to fetched documents whose URL has no usable file name.
pub const DEFAULT_FETCH_NAME: &str = "downloaded.html";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read a local file into an [`UploadedFile`] named after its file name.
pub async fn read_local(path_str: &str) -> Result<UploadedFile, Doc2MdError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(Doc2MdError::FileNotFound { path });
    }
    if !path.is_file() {
        return Err(Doc2MdError::InvalidInput {
            input: path_str.to_string(),
        });
    }

    let content = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => {
            Doc2MdError::PermissionDenied { path: path.clone() }
        }
        _ => Doc2MdError::FileNotFound { path: path.clone() },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());

    debug!("Read local file: {} ({} bytes)", path.display(), content.len());
    Ok(UploadedFile::new(name, content))
}

/// Fetch `url` with `client` and wrap the body as an upload.
///
/// `timeout_secs` is only used to report [`Doc2MdError::FetchTimeout`];
/// the client itself enforces the deadline.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<UploadedFile, Doc2MdError> {
    info!("Fetching: {}", url);

    let request_err = |e: reqwest::Error| {
        if e.is_timeout() {
            Doc2MdError::FetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Doc2MdError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(request_err)?;

    if !response.status().is_success() {
        return Err(Doc2MdError::FetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(request_err)?;
    let name = filename_from_url(url);
    info!("Fetched '{}' ({} bytes)", name, bytes.len());
    Ok(UploadedFile::new(name, bytes.to_vec()))
}

/// Last path segment of `url` when it looks like a file name, else
/// [`DEFAULT_FETCH_NAME`].
pub fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| DEFAULT_FETCH_NAME.to_string())
}

/// Request timeout as a [`Duration`].
pub(crate) fn timeout(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.html"));
        assert!(is_url("http://example.com/doc.html"));
        assert!(!is_url("/tmp/doc.docx"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_last_segment() {
        assert_eq!(filename_from_url("https://example.org/docs/report.pdf"), "report.pdf");
        assert_eq!(filename_from_url("https://example.org/a/page.html?x=1"), "page.html");
    }

    #[test]
    fn filename_defaults_to_html() {
        assert_eq!(filename_from_url("https://example.org/"), DEFAULT_FETCH_NAME);
        assert_eq!(filename_from_url("https://example.org/about"), DEFAULT_FETCH_NAME);
        assert_eq!(filename_from_url("not a url"), DEFAULT_FETCH_NAME);
    }

    #[tokio::test]
    async fn read_local_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.html");
        std::fs::write(&path, b"<p>hi</p>").unwrap();

        let file = read_local(path.to_str().unwrap()).await.unwrap();
        assert_eq!(file.name, "notes.html");
        assert_eq!(file.content, b"<p>hi</p>");
        assert_eq!(file.declared_size, 9);
    }

    #[tokio::test]
    async fn read_local_missing_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.docx");
        let err = read_local(missing.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, Doc2MdError::FileNotFound { .. }));

        let err = read_local(dir.path().to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, Doc2MdError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn fetch_unreachable_host_fails() {
        let client = reqwest::Client::builder()
            .timeout(timeout(2))
            .build()
            .unwrap();
        // Port 9 on localhost is the discard service; nothing listens there in CI.
        let err = fetch(&client, "http://127.0.0.1:9/page.html", 2).await.unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Conversion);
    }
}
