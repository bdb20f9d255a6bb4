//! Annotation document types.
//!
//! These types are the persisted JSON schema. Field names and the
//! null-versus-omitted behaviour of optional fields are part of the
//! format consumed downstream, so they must not change.

use serde::{Deserialize, Serialize};

/// Properties of the annotated video, fixed before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Base name of the input path.
    pub source: String,
    /// Frames per second (always > 0).
    pub fps: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// Frame size as written to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

/// One anatomical landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate.
    pub y: f32,
    /// Per-point confidence, omitted when the model reports none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<f32>,
}

/// One person detection in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Tracker identity; `null` when the tracker did not associate this instance.
    pub track_id: Option<u64>,
    /// Box corners `[x1, y1, x2, y2]`.
    pub bbox_xyxy: [f32; 4],
    /// Detection confidence; `null` when not reported.
    pub score: Option<f32>,
    /// Class label, always `"person"`.
    pub class: String,
    /// Keypoints in the model's native order.
    pub keypoints: Vec<Keypoint>,
}

/// Detections for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Zero-based frame index.
    pub index: u64,
    /// Presentation time in seconds (`index / fps`).
    pub time: f64,
    /// Detections in tracker order.
    pub detections: Vec<Detection>,
}

/// The complete annotation document for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    /// Base name of the input path.
    pub source: String,
    /// Frames per second used for timestamps.
    pub fps: f64,
    /// Frame size.
    pub size: FrameSize,
    /// Frame records in source order.
    pub frames: Vec<FrameRecord>,
}

impl AnnotationDocument {
    /// Create an empty document for the given video.
    pub fn new(metadata: &VideoMetadata) -> Self {
        Self {
            source: metadata.source.clone(),
            fps: metadata.fps,
            size: FrameSize {
                w: metadata.width,
                h: metadata.height,
            },
            frames: Vec::new(),
        }
    }

    /// Total detections across all frames.
    pub fn detection_count(&self) -> usize {
        self.frames.iter().map(|f| f.detections.len()).sum()
    }

    /// Number of distinct track ids seen in the document.
    pub fn track_count(&self) -> usize {
        let mut ids: Vec<u64> = self
            .frames
            .iter()
            .flat_map(|f| f.detections.iter().filter_map(|d| d.track_id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}
