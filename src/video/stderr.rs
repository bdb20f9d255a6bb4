//! Capture of ffmpeg diagnostics.
//!
//! Child stderr goes to an unlinked temporary file rather than a pipe, so a
//! chatty child never blocks on a full pipe nobody is reading.

use crate::constants::ffmpeg::STDERR_TAIL_LINES;
use std::io;
use std::process::Stdio;
use tempfile::NamedTempFile;

/// Temporary file collecting one child's stderr.
pub struct StderrLog {
    file: NamedTempFile,
}

impl StderrLog {
    /// Create an empty log.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            file: NamedTempFile::new()?,
        })
    }

    /// A fresh handle for the child's stderr.
    ///
    /// The handle has its own file offset, so reading the log never moves
    /// the child's write position.
    pub fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::from(self.file.reopen()?))
    }

    /// The last non-empty lines written so far, joined with `"; "`.
    pub fn tail(&self) -> Option<String> {
        let bytes = std::fs::read(self.file.path()).ok()?;
        let text = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        let tail = lines[start..].join("; ");
        (!tail.is_empty()).then_some(tail)
    }
}

/// Write an executable shell script standing in for ffmpeg.
#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
pub fn fake_ffmpeg(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
