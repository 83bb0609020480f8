//! Configuration for the conversion engine and the batch orchestrator.
//!
//! Everything is held in one immutable [`EngineConfig`], built once at
//! process start via [`EngineConfigBuilder`] and passed by reference to every
//! batch. Nothing reconfigures it at runtime; the HTTP client the engine
//! derives from it is constructed exactly once.

use crate::error::Doc2MdError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default outbound User-Agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Default outbound request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Process-wide conversion settings.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .user_agent("doc2md/0.1")
///     .timeout_secs(10)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, 10);
/// ```
#[derive(Clone)]
pub struct EngineConfig {
    /// Value of the `User-Agent` header on every outbound request.
    pub user_agent: String,

    /// Additional outbound headers as `(name, value)` pairs.
    pub headers: Vec<(String, String)>,

    /// Outbound request timeout in seconds. Default: 5.
    ///
    /// Bounds every network step, so a slow remote host can only stall the
    /// file that references it, and only for this long.
    pub timeout_secs: u64,

    /// Number of files converted at once. Default: 1 (sequential).
    ///
    /// Results are always reported in input order regardless of this value.
    pub concurrency: usize,

    /// Optional cap on the wall-clock time of a single file's conversion.
    pub file_timeout_secs: Option<u64>,

    /// Directory for staged scratch files. `None` uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,

    /// Explicit path to the pdfium shared library.
    ///
    /// When `None`, `PDFIUM_LIB_PATH` is consulted, then the system library.
    pub pdfium_library_path: Option<PathBuf>,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            concurrency: 1,
            file_timeout_secs: None,
            scratch_dir: None,
            pdfium_library_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .field("timeout_secs", &self.timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("file_timeout_secs", &self.file_timeout_secs)
            .field("scratch_dir", &self.scratch_dir)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl EngineConfig {
    /// Create a new builder for `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Add one outbound header. Later values for the same name win.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.config
            .headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.config.headers.push((name, value.into()));
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn file_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.file_timeout_secs = secs;
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EngineConfig, Doc2MdError> {
        let c = &self.config;
        if c.user_agent.trim().is_empty() {
            return Err(Doc2MdError::InvalidConfig(
                "User-Agent must not be empty".into(),
            ));
        }
        if c.timeout_secs == 0 {
            return Err(Doc2MdError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(Doc2MdError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.file_timeout_secs == Some(0) {
            return Err(Doc2MdError::InvalidConfig(
                "Per-file timeout must be ≥ 1 second".into(),
            ));
        }
        for (name, value) in &c.headers {
            reqwest::header::HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Doc2MdError::InvalidConfig(format!("Invalid header name '{name}': {e}"))
            })?;
            reqwest::header::HeaderValue::from_str(value).map_err(|e| {
                Doc2MdError::InvalidConfig(format!("Invalid value for header '{name}': {e}"))
            })?;
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(c.timeout_secs, 5);
        assert_eq!(c.concurrency, 1);
        assert!(c.file_timeout_secs.is_none());
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = EngineConfig::builder().timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, Doc2MdError::InvalidConfig(_)));
    }

    #[test]
    fn zero_concurrency_rejected() {
        assert!(EngineConfig::builder().concurrency(0).build().is_err());
    }

    #[test]
    fn zero_file_timeout_rejected() {
        assert!(EngineConfig::builder()
            .file_timeout_secs(Some(0))
            .build()
            .is_err());
    }

    #[test]
    fn empty_user_agent_rejected() {
        assert!(EngineConfig::builder().user_agent("  ").build().is_err());
    }

    #[test]
    fn invalid_header_rejected() {
        let err = EngineConfig::builder()
            .header("Bad Header", "x")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Bad Header"));
    }

    #[test]
    fn header_replaces_same_name() {
        let c = EngineConfig::builder()
            .header("Accept-Language", "en")
            .header("accept-language", "fr")
            .build()
            .unwrap();
        assert_eq!(c.headers, vec![("accept-language".to_string(), "fr".to_string())]);
    }

    #[test]
    fn debug_hides_callback() {
        let c = EngineConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        assert!(format!("{c:?}").contains("<dyn BatchProgressCallback>"));
    }
}
