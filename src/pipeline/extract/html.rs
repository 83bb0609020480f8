//! HTML → Markdown via `html2md`.
//!
//! Only the document itself is converted. Images, stylesheets and other
//! remote assets stay as links and are never fetched.

use crate::error::Doc2MdError;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static RE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn extract(name: &str, bytes: &[u8]) -> Result<String, Doc2MdError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let html = std::str::from_utf8(bytes).map_err(|e| Doc2MdError::InvalidEncoding {
        name: name.to_string(),
        detail: format!("not valid UTF-8 ({e})"),
    })?;

    let html = RE_SCRIPT.replace_all(html, "");
    let html = RE_STYLE.replace_all(&html, "");
    let html = RE_COMMENT.replace_all(&html, "");

    Ok(html2md::parse_html(&html).trim().to_string())
}
