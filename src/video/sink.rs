//! Video sinks.

use crate::constants::ffmpeg::{STARTUP_GRACE, STARTUP_POLL};
use crate::error::{Error, Result};
use crate::video::stderr::StderrLog;
use image::RgbImage;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Instant;
use tracing::{debug, warn};

/// Ordered consumer of rendered frames.
pub trait VideoSink {
    /// Encode one frame. Frames must all have the sink's size.
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flush and close the output. Calling it again is a no-op.
    fn finish(&mut self) -> Result<()>;
}

/// Encodes frames through an `ffmpeg` child process reading RGB24 on stdin.
///
/// The encoder's stderr is kept so failures carry ffmpeg's own message.
pub struct FfmpegSink {
    path: PathBuf,
    width: u32,
    height: u32,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr: StderrLog,
    frames_written: u64,
}

impl FfmpegSink {
    /// Start an encoder writing `path`.
    ///
    /// Fails with [`Error::SinkUnavailable`] when the destination directory
    /// is missing or not writable, the encoder cannot be started, or it
    /// exits straight away (for example on an unknown codec).
    pub fn create(path: &Path, width: u32, height: u32, fps: f64, codec: &str) -> Result<Self> {
        Self::spawn(OsStr::new("ffmpeg"), path, width, height, fps, codec)
    }

    fn spawn(
        program: &OsStr,
        path: &Path,
        width: u32,
        height: u32,
        fps: f64,
        codec: &str,
    ) -> Result<Self> {
        let unavailable = |reason: String| Error::SinkUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        check_writable_dir(path).map_err(unavailable)?;

        let stderr = StderrLog::new().map_err(|e| unavailable(e.to_string()))?;
        let mut child = Command::new(program)
            .args(["-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{width}x{height}")])
            .args(["-r", &fps.to_string()])
            .args(["-i", "-", "-an", "-c:v", codec, "-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(stderr.stdio().map_err(|e| unavailable(e.to_string()))?)
            .spawn()
            .map_err(|e| unavailable(format!("could not start ffmpeg: {e}")))?;

        // Bad options make ffmpeg exit before it reads any input.
        let deadline = Instant::now() + STARTUP_GRACE;
        while Instant::now() < deadline {
            if let Some(status) = child.try_wait().map_err(|e| unavailable(e.to_string()))? {
                let reason = stderr
                    .tail()
                    .unwrap_or_else(|| format!("ffmpeg exited with {status}"));
                return Err(unavailable(reason));
            }
            std::thread::sleep(STARTUP_POLL);
        }

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(unavailable("ffmpeg stdin not captured".to_string()));
        };

        debug!(
            "Encoding {}x{} @ {fps} fps with {codec} to {}",
            width,
            height,
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            child: Some(child),
            stdin: Some(stdin),
            stderr,
            frames_written: 0,
        })
    }

    /// Close stdin, reap the encoder and describe why it stopped.
    fn stop_after_failure(&mut self) -> Option<String> {
        drop(self.stdin.take());
        let status = self.child.take()?.wait().ok();
        self.stderr
            .tail()
            .or_else(|| status.map(|s| format!("ffmpeg exited with {s}")))
    }
}

impl VideoSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(Error::FrameWrite {
                path: self.path.clone(),
                reason: format!(
                    "frame is {}x{}, encoder expects {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            });
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(Error::FrameWrite {
                path: self.path.clone(),
                reason: "encoder already closed".to_string(),
            });
        };
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            let reason = self.stop_after_failure().unwrap_or_else(|| e.to_string());
            return Err(Error::FrameWrite {
                path: self.path.clone(),
                reason,
            });
        }
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // Closing stdin signals end of stream to the encoder.
        drop(self.stdin.take());

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| Error::EncoderFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        if !status.success() {
            return Err(Error::EncoderFailed {
                path: self.path.clone(),
                reason: self
                    .stderr
                    .tail()
                    .unwrap_or_else(|| format!("ffmpeg exited with {status}")),
            });
        }

        debug!(
            "Closed {} after {} frames",
            self.path.display(),
            self.frames_written
        );
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!("{e}");
        }
    }
}

/// The parent directory of `path` must exist and accept new files.
fn check_writable_dir(path: &Path) -> std::result::Result<(), String> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if !dir.is_dir() {
        return Err(format!("directory '{}' does not exist", dir.display()));
    }
    tempfile::tempfile_in(dir)
        .map(drop)
        .map_err(|e| format!("directory '{}' is not writable: {e}", dir.display()))
}
