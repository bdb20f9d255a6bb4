//! Frame sources.

use crate::error::{Error, Result};
use crate::video::probe::{VideoProperties, probe_video};
use crate::video::stderr::StderrLog;
use image::RgbImage;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::{debug, warn};

/// Ordered supplier of decoded RGB frames.
pub trait FrameSource {
    /// Stream properties, available before the first frame is read.
    fn properties(&self) -> VideoProperties;

    /// Read the next frame; `Ok(None)` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Decodes a video file through an `ffmpeg` child process.
///
/// Frames arrive as packed RGB24 on the child's stdout, one per decoded
/// source frame. The child is killed and reaped when the source is dropped.
pub struct FfmpegSource {
    path: PathBuf,
    properties: VideoProperties,
    child: Child,
    stdout: ChildStdout,
    stderr: StderrLog,
    frames_read: u64,
}

impl FfmpegSource {
    /// Open `path` for decoding.
    ///
    /// Fails with [`Error::SourceUnavailable`] when the file cannot be read,
    /// has no video stream, or the decoder cannot be started.
    pub fn open(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| Error::SourceUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(unavailable("no such file".to_string()));
        }
        File::open(path).map_err(|e| unavailable(e.to_string()))?;

        let properties = probe_video(path).map_err(unavailable)?;
        debug!(
            "Probed {}: {}x{} @ {:?} fps, {:?} frames",
            path.display(),
            properties.width,
            properties.height,
            properties.fps,
            properties.frame_count
        );

        Self::start(OsStr::new("ffmpeg"), path, properties)
    }

    fn start(program: &OsStr, path: &Path, properties: VideoProperties) -> Result<Self> {
        let unavailable = |reason: String| Error::SourceUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let stderr = StderrLog::new().map_err(|e| unavailable(e.to_string()))?;
        let mut child = Command::new(program)
            .args(decoder_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(stderr.stdio().map_err(|e| unavailable(e.to_string()))?)
            .spawn()
            .map_err(|e| unavailable(format!("could not start ffmpeg: {e}")))?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(unavailable("ffmpeg stdout not captured".to_string()));
        };

        Ok(Self {
            path: path.to_path_buf(),
            properties,
            child,
            stdout,
            stderr,
            frames_read: 0,
        })
    }

    fn frame_len(&self) -> usize {
        self.properties.width as usize * self.properties.height as usize * 3
    }

    fn read_error(&self, reason: String) -> Error {
        Error::FrameRead {
            path: self.path.clone(),
            index: self.frames_read,
            reason,
        }
    }
}

impl FrameSource for FfmpegSource {
    fn properties(&self) -> VideoProperties {
        self.properties
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut buf = vec![0u8; self.frame_len()];
        let mut filled = 0;
        while filled < buf.len() {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(self.read_error(e.to_string())),
            }
        }

        if filled == 0 {
            let status = self
                .child
                .wait()
                .map_err(|e| self.read_error(e.to_string()))?;
            if !status.success() {
                let reason = self
                    .stderr
                    .tail()
                    .unwrap_or_else(|| format!("decoder exited with {status}"));
                return Err(self.read_error(reason));
            }
            return Ok(None);
        }
        if filled < buf.len() {
            // stdout hit EOF, so the decoder is exiting and its log is complete.
            let _ = self.child.wait();
            let mut reason = format!("truncated frame ({filled} of {} bytes)", buf.len());
            if let Some(detail) = self.stderr.tail() {
                reason.push_str(": ");
                reason.push_str(&detail);
            }
            return Err(self.read_error(reason));
        }

        self.frames_read += 1;
        RgbImage::from_raw(self.properties.width, self.properties.height, buf)
            .map(Some)
            .ok_or_else(|| self.read_error("frame buffer size mismatch".to_string()))
    }
}

/// Arguments decoding the first video stream to raw RGB24 on stdout.
///
/// `-fps_mode passthrough` keeps ffmpeg from duplicating or dropping frames
/// to reach a constant rate, so every source frame is emitted exactly once.
/// `-map 0:v:0` decodes the same stream `ffprobe` described.
fn decoder_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-noautorotate", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_os_string());
    args.extend(
        [
            "-map",
            "0:v:0",
            "-fps_mode",
            "passthrough",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None))
            && let Err(e) = self.child.kill()
        {
            warn!("Failed to stop decoder for {}: {e}", self.path.display());
        }
        let _ = self.child.wait();
        debug!(
            "Released source {} after {} frames",
            self.path.display(),
            self.frames_read
        );
    }
}
