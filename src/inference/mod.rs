//! Pose detection, tracking and overlay rendering.

mod boxes;
mod detector;
mod letterbox;
mod render;
mod stream;
mod tracker;
mod types;

pub use boxes::{iou, non_max_suppression};
pub use detector::{DetectorOptions, PoseDetector, PoseLayout, YoloPoseDetector, decode_output};
pub use letterbox::{Letterbox, letterbox};
pub use render::{SKELETON, box_color, render_overlay};
pub use stream::TrackedFrames;
pub use tracker::{ByteTracker, Tracker, TrackerConfig};
pub use types::{PoseDetection, RawDetections, RawKeypoints, TrackedFrame};
