//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "posemark";

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default pose model weights (YOLOv8 nano pose, ONNX export).
pub const DEFAULT_MODEL: &str = "yolov8n-pose.onnx";

/// Default minimum detection confidence.
pub const DEFAULT_CONFIDENCE: f32 = 0.30;

/// Default IoU threshold for non-maximum suppression.
pub const DEFAULT_IOU: f32 = 0.5;

/// Default tracker configuration reference.
pub const DEFAULT_TRACKER: &str = "bytetrack.yaml";

/// Default maximum number of detections kept per frame after NMS.
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

/// Frame rate substituted when the source does not report one.
pub const DEFAULT_FPS: f64 = 30.0;

/// Default video codec passed to the encoder (`mp4v` equivalent).
pub const DEFAULT_CODEC: &str = "mpeg4";

/// Class label written for every surviving detection.
pub const PERSON_LABEL: &str = "person";

/// COCO class index for person.
pub const PERSON_CLASS_ID: u32 = 0;

/// Inference resolution policy.
pub mod inference_size {
    /// Inference sizes are rounded up to a multiple of this stride.
    pub const STRIDE: u32 = 32;

    /// Smallest inference size ever used.
    pub const MIN: u32 = 640;
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
}

/// YOLO pose model layout.
pub mod pose {
    /// Keypoints per person in the COCO-Pose layout.
    pub const NUM_KEYPOINTS: usize = 17;

    /// Values per keypoint in the raw model output (x, y, visibility).
    pub const KEYPOINT_DIMS: usize = 3;

    /// Grey level used to pad letterboxed input images.
    pub const LETTERBOX_FILL: u8 = 114;

    /// Name of the image input of exported YOLO models.
    pub const INPUT_NAME: &str = "images";
}

/// Built-in `ByteTrack` defaults (match `bytetrack.yaml`).
pub mod tracker {
    /// Built-in tracker names accepted as a tracker reference.
    pub const BUILTIN_NAMES: &[&str] = &["bytetrack", "bytetrack.yaml"];
    /// Score above which detections take part in the first association.
    pub const TRACK_HIGH_THRESH: f32 = 0.5;
    /// Score below which detections are ignored entirely.
    pub const TRACK_LOW_THRESH: f32 = 0.1;
    /// Score a detection needs to start a new track.
    pub const NEW_TRACK_THRESH: f32 = 0.6;
    /// Frames a lost track is kept before removal (at 30 fps).
    pub const TRACK_BUFFER: u32 = 30;
    /// Maximum association cost (1 - IoU) for the first association.
    pub const MATCH_THRESH: f32 = 0.8;
    /// Maximum association cost for the second, low-score association.
    pub const SECOND_MATCH_THRESH: f32 = 0.5;
    /// Maximum association cost for tracks that are not yet confirmed.
    pub const UNCONFIRMED_MATCH_THRESH: f32 = 0.7;
    /// Reference frame rate the track buffer is expressed in.
    pub const BUFFER_REFERENCE_FPS: f64 = 30.0;
}

/// Overlay rendering constants.
pub mod render {
    /// Keypoints below this confidence are not drawn.
    pub const KEYPOINT_DRAW_THRESH: f32 = 0.5;
    /// Radius of drawn keypoints in pixels.
    pub const KEYPOINT_RADIUS: i32 = 4;
    /// Box outline thickness in pixels.
    pub const BOX_THICKNESS: i32 = 2;
    /// Limb thickness in pixels.
    pub const LIMB_THICKNESS: i32 = 2;
}

/// ffmpeg child process constants.
pub mod ffmpeg {
    use std::time::Duration;

    /// How long a freshly started encoder is watched for an immediate exit.
    pub const STARTUP_GRACE: Duration = Duration::from_millis(300);
    /// Polling interval while watching the encoder start.
    pub const STARTUP_POLL: Duration = Duration::from_millis(10);
    /// Trailing stderr lines carried into error messages.
    pub const STDERR_TAIL_LINES: usize = 3;
}
