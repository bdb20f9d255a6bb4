//! Run setup: stream metadata, inference resolution and output locations.

use crate::config::InferenceDevice;
use crate::constants::{DEFAULT_FPS, inference_size as size};
use crate::error::{Error, Result};
use crate::output::VideoMetadata;
use crate::video::VideoProperties;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Options for annotating a single video.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Input video.
    pub source: PathBuf,
    /// Rendered video destination.
    pub video_out: PathBuf,
    /// Annotation document destination.
    pub json_out: PathBuf,
    /// Pose model weights.
    pub model: PathBuf,
    /// Inference device.
    pub device: InferenceDevice,
    /// Minimum detection confidence.
    pub confidence: f32,
    /// NMS IoU threshold.
    pub iou: f32,
    /// Tracker reference (built-in name or config path).
    pub tracker: String,
    /// Fixed inference size; computed from the frame size when `None`.
    pub imgsz: Option<u32>,
    /// Maximum detections per frame.
    pub max_detections: usize,
    /// Encoder codec name.
    pub codec: String,
    /// Pretty-print the JSON document.
    pub pretty_json: bool,
    /// Show a progress bar.
    pub progress: bool,
}

/// Inference resolution for a frame of `width` x `height`.
///
/// The longer side rounded up to the model stride, never below the
/// minimum size.
pub fn inference_size(width: u32, height: u32) -> u32 {
    let longest = width.max(height);
    (longest.div_ceil(size::STRIDE) * size::STRIDE).max(size::MIN)
}

/// Frame rate to use for timing, falling back when the source reports none.
pub fn resolve_fps(reported: Option<f64>) -> f64 {
    match reported {
        Some(fps) if fps.is_finite() && fps > 0.0 => fps,
        Some(fps) => {
            warn!("Source reports invalid frame rate {fps}, assuming {DEFAULT_FPS} fps");
            DEFAULT_FPS
        }
        None => {
            warn!("Source does not report a frame rate, assuming {DEFAULT_FPS} fps");
            DEFAULT_FPS
        }
    }
}

/// Display name of the source: its final path component.
pub fn source_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// Metadata recorded in the annotation document.
pub fn video_metadata(source: &Path, properties: &VideoProperties) -> VideoMetadata {
    VideoMetadata {
        source: source_name(source),
        fps: resolve_fps(properties.fps),
        width: properties.width,
        height: properties.height,
    }
}

/// Create the parent directory of an output file when missing.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if !dir.is_dir() {
        debug!("Creating output directory {}", dir.display());
        std::fs::create_dir_all(dir).map_err(|e| Error::OutputDirCreateFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}
