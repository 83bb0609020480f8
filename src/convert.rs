//! Batch orchestration: every uploaded file in, one entry per file out.
//!
//! Each file goes through detect → stage (when the engine needs a path) →
//! convert → release → report. Any failure along the way is folded into a
//! [`FileError`](crate::error::FileError) on that file's entry and logged;
//! it never reaches the caller and never stops the files after it.
//!
//! Use [`crate::stream::process_batch_stream`] instead when entries should
//! be handled as soon as each file finishes.

use crate::config::EngineConfig;
use crate::engine::{ConversionEngine, EngineInput};
use crate::error::Doc2MdError;
use crate::output::{ArtifactKind, BatchEntry, BatchOutput, BatchStats, UploadedFile};
use crate::pipeline::{detect, staging};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Convert a batch of uploads.
///
/// Always returns exactly one [`BatchEntry`] per input file, in input order,
/// whatever `config.concurrency` is.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doc2md::{process_batch, ConversionEngine, EngineConfig, MarkdownEngine, UploadedFile};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = EngineConfig::default();
/// let engine: Arc<dyn ConversionEngine> = Arc::new(MarkdownEngine::new(&config)?);
/// let files = vec![UploadedFile::new("notes.html", std::fs::read("notes.html")?)];
/// let output = process_batch(files, &engine, &config).await;
/// for entry in &output.entries {
///     println!("{}: {}", entry.file.name, entry.is_success());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn process_batch(
    files: Vec<UploadedFile>,
    engine: &Arc<dyn ConversionEngine>,
    config: &EngineConfig,
) -> BatchOutput {
    let start = Instant::now();
    let total = files.len();
    info!(
        "Starting batch: {} files via '{}' engine (concurrency {})",
        total,
        engine.name(),
        config.concurrency
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let entries: Vec<BatchEntry> = stream::iter(files.into_iter().enumerate().map(|(i, file)| {
        let engine = Arc::clone(engine);
        async move { process_indexed(file, i + 1, total, engine.as_ref(), config).await }
    }))
    .buffered(config.concurrency.max(1))
    .collect()
    .await;

    let stats = BatchStats::from_entries(&entries, start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {}/{} converted, {}ms total",
        stats.converted_files, stats.total_files, stats.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(stats.total_files, stats.converted_files);
    }

    BatchOutput { entries, stats }
}

/// Convert a single upload. Never fails: errors become a failed entry.
pub async fn process_file(
    file: UploadedFile,
    engine: &dyn ConversionEngine,
    config: &EngineConfig,
) -> BatchEntry {
    let start = Instant::now();
    let outcome = convert_one(&file, engine, config).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(content) => {
            let entry = BatchEntry::converted(file, content, duration_ms);
            debug!(
                "Converted '{}' in {}ms ({} → {} bytes)",
                entry.file.name,
                duration_ms,
                entry.file.declared_size,
                entry.result.content.len()
            );
            entry
        }
        Err(e) => {
            warn!("Failed to convert '{}': {}", file.name, e);
            let error = e.into_file_error(&file.name);
            BatchEntry::failed(file, error, duration_ms)
        }
    }
}

/// [`process_file`] plus the per-file progress events.
pub(crate) async fn process_indexed(
    file: UploadedFile,
    index: usize,
    total: usize,
    engine: &dyn ConversionEngine,
    config: &EngineConfig,
) -> BatchEntry {
    if let Some(ref cb) = config.progress_callback {
        cb.on_file_start(index, total, &file.name);
    }

    let entry = process_file(file, engine, config).await;

    if let Some(ref cb) = config.progress_callback {
        match (&entry.report, &entry.result.error) {
            (Some(report), _) => cb.on_file_complete(index, total, &entry.file.name, report),
            (None, Some(error)) => cb.on_file_error(index, total, &entry.file.name, error.detail()),
            (None, None) => {}
        }
    }
    entry
}

async fn convert_one(
    file: &UploadedFile,
    engine: &dyn ConversionEngine,
    config: &EngineConfig,
) -> Result<String, Doc2MdError> {
    let format = detect::detect(file)?;
    debug!("'{}' detected as {}", file.name, format);

    let conversion = async {
        if engine.needs_staging(format) {
            let staged = staging::stage(
                &file.name,
                &file.content,
                &format.staging_suffix(),
                config.scratch_dir.as_deref(),
            )?;
            let result = engine
                .convert(
                    EngineInput::Staged {
                        name: &file.name,
                        path: staged.path(),
                    },
                    format,
                )
                .await;
            staging::release_quietly(staged);
            result
        } else {
            engine
                .convert(
                    EngineInput::Bytes {
                        name: &file.name,
                        data: &file.content,
                    },
                    format,
                )
                .await
        }
    };

    match config.file_timeout_secs {
        // Dropping the timed-out future drops the staged handle, which removes it.
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), conversion)
            .await
            .map_err(|_| Doc2MdError::ConversionTimeout {
                name: file.name.clone(),
                secs,
            })?,
        None => conversion.await,
    }
}

/// Write the requested artifacts of a successful entry into `dir`.
///
/// Each file is written to a temporary name and renamed into place, so a
/// crash never leaves a partial artifact. Failed entries write nothing.
pub async fn write_artifacts(
    entry: &BatchEntry,
    dir: &Path,
    kinds: &[ArtifactKind],
) -> Result<Vec<PathBuf>, Doc2MdError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Doc2MdError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut written = Vec::new();
    for artifact in kinds.iter().filter_map(|&k| entry.artifact(k)) {
        let path = dir.join(&artifact.file_name);
        let tmp_path = dir.join(format!(".{}.tmp", artifact.file_name));
        let write_err = |e| Doc2MdError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        };

        tokio::fs::write(&tmp_path, &artifact.content)
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(write_err)?;

        debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Synchronous wrapper around [`process_batch`].
///
/// Creates a temporary tokio runtime internally; do not call from async code.
pub fn process_batch_sync(
    files: Vec<UploadedFile>,
    engine: &Arc<dyn ConversionEngine>,
    config: &EngineConfig,
) -> Result<BatchOutput, Doc2MdError> {
    Ok(tokio::runtime::Runtime::new()
        .map_err(|e| Doc2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_batch(files, engine, config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes HTML bytes; fails on files whose name contains "bad".
    struct EchoEngine;

    #[async_trait]
    impl ConversionEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        async fn convert(
            &self,
            input: EngineInput<'_>,
            _format: detect::DocumentFormat,
        ) -> Result<String, Doc2MdError> {
            match input {
                EngineInput::Bytes { name, .. } if name.contains("bad") => {
                    Err(Doc2MdError::CorruptDocument {
                        name: name.to_string(),
                        detail: "scripted failure".into(),
                    })
                }
                EngineInput::Bytes { data, .. } => Ok(String::from_utf8_lossy(data).into_owned()),
                EngineInput::Staged { path, .. } => Ok(std::fs::read_to_string(path).unwrap()),
            }
        }
    }

    fn echo() -> Arc<dyn ConversionEngine> {
        Arc::new(EchoEngine)
    }

    #[tokio::test]
    async fn failure_does_not_stop_batch() {
        let files = vec![
            UploadedFile::new("a.html", "alpha"),
            UploadedFile::new("bad.html", "beta"),
            UploadedFile::new("c.html", "gamma"),
        ];
        let out = process_batch(files, &echo(), &EngineConfig::default()).await;

        let names: Vec<_> = out.entries.iter().map(|e| e.file.name.as_str()).collect();
        assert_eq!(names, ["a.html", "bad.html", "c.html"]);
        assert!(out.entries[0].is_success());
        assert!(!out.entries[1].is_success());
        assert!(out.entries[1].report.is_none());
        assert!(matches!(out.entries[1].result.error, Some(FileError::Conversion { .. })));
        assert!(out.entries[2].is_success());
        assert_eq!(out.stats.converted_files, 2);
        assert_eq!(out.stats.failed_files, 1);
    }

    #[tokio::test]
    async fn unsupported_extension_never_reaches_engine() {
        let out = process_batch(
            vec![UploadedFile::new("notes.txt", "plain")],
            &echo(),
            &EngineConfig::default(),
        )
        .await;
        assert!(matches!(
            out.entries[0].result.error,
            Some(FileError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn staged_files_are_removed() {
        let scratch = tempfile::tempdir().unwrap();
        let config = EngineConfig::builder()
            .scratch_dir(scratch.path())
            .build()
            .unwrap();
        let out = process_batch(
            vec![UploadedFile::new("sheet.xlsx", "cells")],
            &echo(),
            &config,
        )
        .await;
        assert_eq!(out.entries[0].result.content, "cells");
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn staging_failure_is_storage_error() {
        let scratch = tempfile::tempdir().unwrap();
        let config = EngineConfig::builder()
            .scratch_dir(scratch.path().join("missing"))
            .build()
            .unwrap();
        let out = process_batch(vec![UploadedFile::new("a.pdf", "x")], &echo(), &config).await;
        assert!(matches!(out.entries[0].result.error, Some(FileError::Storage { .. })));
    }

    struct SlowEngine;

    #[async_trait]
    impl ConversionEngine for SlowEngine {
        fn name(&self) -> &str {
            "slow"
        }

        async fn convert(
            &self,
            _input: EngineInput<'_>,
            _format: detect::DocumentFormat,
        ) -> Result<String, Doc2MdError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(String::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn per_file_timeout_fails_only_that_file() {
        let config = EngineConfig::builder()
            .file_timeout_secs(Some(1))
            .build()
            .unwrap();
        let engine: Arc<dyn ConversionEngine> = Arc::new(SlowEngine);
        let out = process_batch(vec![UploadedFile::new("a.html", "x")], &engine, &config).await;
        let error = out.entries[0].result.error.as_ref().unwrap();
        assert!(error.detail().contains("timed out"), "{error:?}");
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl crate::progress::BatchProgressCallback for Recorder {
        fn on_batch_start(&self, total: usize) {
            self.0.lock().unwrap().push(format!("start {total}"));
        }
        fn on_file_complete(&self, i: usize, t: usize, name: &str, _r: &crate::SizeReport) {
            self.0.lock().unwrap().push(format!("ok {i}/{t} {name}"));
        }
        fn on_file_error(&self, i: usize, t: usize, name: &str, _e: &str) {
            self.0.lock().unwrap().push(format!("err {i}/{t} {name}"));
        }
        fn on_batch_complete(&self, total: usize, converted: usize) {
            self.0.lock().unwrap().push(format!("done {converted}/{total}"));
        }
    }

    #[tokio::test]
    async fn progress_events_in_order() {
        let recorder = Arc::new(Recorder::default());
        let config = EngineConfig::builder()
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        process_batch(
            vec![UploadedFile::new("a.html", "a"), UploadedFile::new("bad.html", "b")],
            &echo(),
            &config,
        )
        .await;
        assert_eq!(
            *recorder.0.lock().unwrap(),
            ["start 2", "ok 1/2 a.html", "err 2/2 bad.html", "done 1/2"]
        );
    }

    #[tokio::test]
    async fn artifacts_written_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile::new("report.html", "# Hi\n");
        let entry = process_file(file, &EchoEngine, &EngineConfig::default()).await;

        let paths = write_artifacts(&entry, dir.path(), &ArtifactKind::ALL).await.unwrap();
        assert_eq!(paths.len(), 2);
        let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("report_converted.md"), "# Hi\n");
        assert_eq!(read("report_converted.txt"), "# Hi\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn failed_entry_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile::new("bad.html", "x");
        let entry = process_file(file, &EchoEngine, &EngineConfig::default()).await;
        let paths = write_artifacts(&entry, dir.path(), &ArtifactKind::ALL).await.unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn sync_wrapper_runs_batch() {
        let out = process_batch_sync(
            vec![UploadedFile::new("a.html", "x")],
            &echo(),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(out.entries.len(), 1);
    }
}
