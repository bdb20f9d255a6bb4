//! Raw per-frame results produced by the detection and tracking stage.
//!
//! The layout mirrors what pose models emit: one array per attribute, each
//! indexed by detection. Attributes the model or tracker did not produce for
//! a frame are `None` as a whole.

use image::RgbImage;

/// One detection as produced by a pose detector, in source pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseDetection {
    /// Box as `[x1, y1, x2, y2]`.
    pub bbox: [f32; 4],
    /// Detection confidence.
    pub score: f32,
    /// Class index (COCO numbering).
    pub class_id: u32,
    /// Keypoint coordinates in model order; empty for box-only models.
    pub keypoints: Vec<[f32; 2]>,
    /// Per-keypoint confidence, when the model reports it.
    pub keypoint_conf: Option<Vec<f32>>,
}

/// Keypoints for every detection in a frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawKeypoints {
    /// Per-detection keypoint coordinates in model order.
    pub xy: Vec<Vec<[f32; 2]>>,
    /// Per-detection keypoint confidences, when the model reports them.
    pub conf: Option<Vec<Vec<f32>>>,
}

/// Unfiltered detections for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDetections {
    /// Boxes as `[x1, y1, x2, y2]` in source pixels.
    pub boxes_xyxy: Vec<[f32; 4]>,
    /// Class index per box.
    pub classes: Option<Vec<u32>>,
    /// Detection confidence per box.
    pub confidences: Option<Vec<f32>>,
    /// Track id per box; `None` entries were not associated this frame.
    pub track_ids: Option<Vec<Option<u64>>>,
    /// Keypoints per box.
    pub keypoints: Option<RawKeypoints>,
}

impl RawDetections {
    /// Number of boxes in the frame.
    pub fn len(&self) -> usize {
        self.boxes_xyxy.len()
    }

    /// Whether the frame has no boxes.
    pub fn is_empty(&self) -> bool {
        self.boxes_xyxy.is_empty()
    }
}

/// One tracked frame: the rendered image plus its raw detections.
#[derive(Debug, Clone)]
pub struct TrackedFrame {
    /// Source frame with boxes and skeletons drawn on it.
    pub rendered: RgbImage,
    /// Detections for the frame.
    pub detections: RawDetections,
}
