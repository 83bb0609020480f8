//! Size/reduction reporting: how much smaller the text is than the upload.
//!
//! Sizes are UTF-8 byte lengths, not character counts, so a page of CJK
//! text or emoji is measured the way it will be stored and downloaded.

use crate::output::SizeReport;

/// Measure `converted` against the original upload size.
pub fn report(original_bytes: u64, converted: &str) -> SizeReport {
    let converted_bytes = converted.len() as u64;
    SizeReport {
        original_bytes,
        converted_bytes,
        reduction_percent: reduction_percent(original_bytes, converted_bytes),
    }
}

/// `(original - converted) / original * 100`, or `0` for an empty original.
pub fn reduction_percent(original_bytes: u64, converted_bytes: u64) -> f64 {
    if original_bytes == 0 {
        return 0.0;
    }
    let original = original_bytes as f64;
    (original - converted_bytes as f64) / original * 100.0
}
