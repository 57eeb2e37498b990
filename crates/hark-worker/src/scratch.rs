//! Scoped scratch files.
//!
//! A [`ScratchFile`] owns one uniquely named file for the lifetime of one
//! job. The file is removed when the guard is closed or dropped, whichever
//! comes first, so every exit path of the pipeline cleans up.

use std::io::Write;
use std::path::Path;

use tempfile::{Builder, TempPath};
use tracing::{debug, warn};

use crate::metrics::SCRATCH_CLEANUP_FAILURES_TOTAL;

const PREFIX: &str = "hark-";

/// Owns a staged audio file until the job finishes.
#[derive(Debug)]
pub struct ScratchFile {
    path: Option<TempPath>,
}

impl ScratchFile {
    /// Write `bytes` to a new file ending in `.{extension}`.
    ///
    /// Uses `dir` when given (created if missing), the OS temp dir otherwise.
    /// A partially written file is removed before the error is returned.
    pub fn create(bytes: &[u8], extension: &str, dir: Option<&Path>) -> std::io::Result<Self> {
        let suffix = format!(".{extension}");
        let mut builder = Builder::new();
        let _ = builder.prefix(PREFIX).suffix(&suffix);
        let mut file = match dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        let path = file.into_temp_path();
        debug!(path = %path.display(), bytes = bytes.len(), "audio staged");
        Ok(Self { path: Some(path) })
    }

    /// Location of the staged file.
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Remove the file now, logging a failure instead of returning it.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let shown = path.display().to_string();
        match path.close() {
            Ok(()) => debug!(path = %shown, "scratch file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %shown, "scratch file already gone");
            }
            Err(e) => {
                warn!(path = %shown, error = %e, "failed to remove scratch file");
                metrics::counter!(SCRATCH_CLEANUP_FAILURES_TOTAL).increment(1);
            }
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        self.release();
    }
}
