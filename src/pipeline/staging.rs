//! Scratch storage for parsers that need a file on disk.
//!
//! Some parsers (pdfium, calamine's format-sniffing opener) cannot read
//! from a byte buffer. [`stage`] writes the upload to a uniquely named
//! [`tempfile::NamedTempFile`] that keeps the original extension as its
//! suffix. The returned [`StagedFile`] owns that file: [`StagedFile::release`]
//! removes it and reports failures, and dropping the handle on any other
//! path (early return, error, panic, cancelled future) removes it as well.

use crate::error::Doc2MdError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Prefix of every scratch file name.
pub const STAGING_PREFIX: &str = "doc2md-";

/// A staged copy of an upload. Removed on [`release`](Self::release) or drop.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the backing file now, surfacing any error.
    pub fn release(self) -> Result<(), Doc2MdError> {
        let path = self.file.path().to_path_buf();
        self.file
            .close()
            .map_err(|source| Doc2MdError::ReleaseFailed {
                path: path.clone(),
                source,
            })?;
        debug!("Released scratch file {}", path.display());
        Ok(())
    }
}

/// Write `bytes` to a fresh scratch file named `doc2md-<random><suffix>`.
///
/// Names come from `tempfile`'s random generator and are created with
/// `O_EXCL`, so concurrent calls never collide.
pub fn stage(
    name: &str,
    bytes: &[u8],
    suffix: &str,
    scratch_dir: Option<&Path>,
) -> Result<StagedFile, Doc2MdError> {
    let staging_err = |source| Doc2MdError::StagingFailed {
        name: name.to_string(),
        source,
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGING_PREFIX).suffix(suffix);
    let mut file = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(staging_err)?;

    file.write_all(bytes).map_err(staging_err)?;
    file.flush().map_err(staging_err)?;

    debug!(
        "Staged '{}' ({} bytes) at {}",
        name,
        bytes.len(),
        file.path().display()
    );
    Ok(StagedFile { file })
}

/// Release a staged file, logging instead of failing.
///
/// Used after a conversion has already produced its outcome, where a
/// cleanup error must not change that outcome.
pub fn release_quietly(staged: StagedFile) {
    let path: PathBuf = staged.path().to_path_buf();
    if let Err(e) = staged.release() {
        warn!("Could not remove scratch file {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn stage_writes_bytes_with_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage("a.pdf", b"%PDF-1.4", ".pdf", Some(dir.path())).unwrap();

        let path = staged.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
        let fname = path.file_name().unwrap().to_str().unwrap();
        assert!(fname.starts_with(STAGING_PREFIX), "{fname}");
        assert!(fname.ends_with(".pdf"), "{fname}");

        staged.release().unwrap();
        assert!(!path.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let staged = stage("a.xlsx", b"PK", ".xlsx", Some(dir.path())).unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let staged: Vec<_> = (0..32)
            .map(|_| stage("same.pdf", b"x", ".pdf", Some(dir.path())).unwrap())
            .collect();
        let names: HashSet<_> = staged.iter().map(|s| s.path().to_path_buf()).collect();
        assert_eq!(names.len(), 32);
    }

    #[test]
    fn concurrent_staging_does_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let root = root.clone();
                std::thread::spawn(move || {
                    let staged = stage("c.pdf", &[i as u8; 16], ".pdf", Some(&root)).unwrap();
                    let content = std::fs::read(staged.path()).unwrap();
                    staged.release().unwrap();
                    content
                })
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap(), vec![i as u8; 16]);
        }
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn missing_scratch_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = stage("a.pdf", b"x", ".pdf", Some(&missing)).unwrap_err();
        assert!(matches!(err, Doc2MdError::StagingFailed { .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Storage);
    }
}
