//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::EngineConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through a batch. Callers can forward
//! them to a terminal progress bar, a channel or a UI without the library
//! knowing how the host application presents results.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2md::{BatchProgressCallback, EngineConfig, SizeReport};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     converted: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, _index: usize, _total: usize, name: &str, report: &SizeReport) {
//!         self.converted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{name}: {:.1}% smaller", report.reduction_percent);
//!     }
//! }
//!
//! let config = EngineConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { converted: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::SizeReport;
use std::sync::Arc;

/// Called by the orchestrator as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. With `concurrency > 1` the per-file methods may be
/// called from several tasks at once; guard shared state accordingly.
///
/// `index` is 1-based and refers to the file's position in the batch.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first file is touched.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is staged or converted.
    fn on_file_start(&self, index: usize, total_files: usize, name: &str) {
        let _ = (index, total_files, name);
    }

    /// Called when a file converted successfully.
    fn on_file_complete(&self, index: usize, total_files: usize, name: &str, report: &SizeReport) {
        let _ = (index, total_files, name, report);
    }

    /// Called when a file failed. `error` is the detailed cause.
    fn on_file_error(&self, index: usize, total_files: usize, name: &str, error: &str) {
        let _ = (index, total_files, name, error);
    }

    /// Called once after every file has a result.
    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let _ = (total_files, converted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EngineConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
