//! Streaming batch API: yield each file's entry as soon as it is ready.
//!
//! [`crate::convert::process_batch`] returns only after every file is done.
//! [`process_batch_stream`] hands out [`BatchEntry`] values one by one so a
//! caller can show results, write artifacts or free memory while the rest
//! of the batch is still converting. Entries still come out in input order;
//! with `concurrency > 1` later files convert in the background while an
//! earlier slow one finishes.

use crate::config::EngineConfig;
use crate::convert::process_indexed;
use crate::engine::ConversionEngine;
use crate::output::{BatchEntry, UploadedFile};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-file entries.
pub type EntryStream = Pin<Box<dyn Stream<Item = BatchEntry> + Send>>;

/// Convert a batch, streaming entries in input order.
///
/// Per-file semantics match `process_batch`: one entry per file, failures
/// recorded on the entry, scratch files removed. Progress callbacks receive
/// `on_batch_start` immediately and per-file events as the stream is
/// polled; `on_batch_complete` is not sent since the caller decides when
/// the stream is finished.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doc2md::{process_batch_stream, ConversionEngine, EngineConfig, MarkdownEngine, UploadedFile};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = EngineConfig::default();
/// let engine: Arc<dyn ConversionEngine> = Arc::new(MarkdownEngine::new(&config)?);
/// let files = vec![UploadedFile::new("a.html", std::fs::read("a.html")?)];
/// let mut entries = process_batch_stream(files, engine, &config);
/// while let Some(entry) = entries.next().await {
///     match &entry.report {
///         Some(r) => println!("{}: {:.1}% smaller", entry.file.name, r.reduction_percent),
///         None => eprintln!("{}: failed", entry.file.name),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn process_batch_stream(
    files: Vec<UploadedFile>,
    engine: Arc<dyn ConversionEngine>,
    config: &EngineConfig,
) -> EntryStream {
    let total = files.len();
    let concurrency = config.concurrency.max(1);
    info!("Starting streaming batch: {} files", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let config = Arc::new(config.clone());
    let s = stream::iter(files.into_iter().enumerate().map(move |(i, file)| {
        let engine = Arc::clone(&engine);
        let cfg = Arc::clone(&config);
        async move { process_indexed(file, i + 1, total, engine.as_ref(), &cfg).await }
    }))
    .buffered(concurrency);

    Box::pin(s)
}
