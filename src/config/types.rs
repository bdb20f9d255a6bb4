//! Configuration type definitions.

use crate::constants::{
    DEFAULT_CODEC, DEFAULT_CONFIDENCE, DEFAULT_IOU, DEFAULT_MAX_DETECTIONS, DEFAULT_MODEL,
    DEFAULT_TRACKER,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default annotation settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Inference settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Default annotation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Pose model weights (ONNX).
    pub model: PathBuf,

    /// Minimum detection confidence.
    pub confidence: f32,

    /// IoU threshold for non-maximum suppression.
    pub iou: f32,

    /// Tracker configuration reference (built-in name or TOML path).
    pub tracker: String,

    /// Fixed inference size; computed from the video resolution when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imgsz: Option<u32>,

    /// Maximum detections kept per frame.
    pub max_detections: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from(DEFAULT_MODEL),
            confidence: DEFAULT_CONFIDENCE,
            iou: DEFAULT_IOU,
            tracker: DEFAULT_TRACKER.to_string(),
            imgsz: None,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }
}

/// Inference device selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InferenceDevice {
    /// Use CUDA device 0 when available, else CPU.
    #[default]
    Auto,
    /// Force CPU inference.
    Cpu,
    /// Use the given CUDA device, fail if unavailable.
    Cuda(u32),
}

impl std::fmt::Display for InferenceDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(id) => write!(f, "cuda:{id}"),
        }
    }
}

impl std::str::FromStr for InferenceDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "auto" | "" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda(0)),
            other => {
                // "cuda:1" or a bare device index such as "0"
                let index = other.strip_prefix("cuda:").unwrap_or(other);
                index
                    .parse::<u32>()
                    .map(Self::Cuda)
                    .map_err(|_| format!("unknown device: {s} (expected auto, cpu, cuda or cuda:N)"))
            }
        }
    }
}

impl TryFrom<String> for InferenceDevice {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InferenceDevice> for String {
    fn from(device: InferenceDevice) -> Self {
        device.to_string()
    }
}

/// Inference settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Device to use for inference.
    pub device: InferenceDevice,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Encoder codec name passed to ffmpeg.
    pub codec: String,

    /// Pretty-print the annotation JSON.
    pub pretty_json: bool,

    /// Show a progress bar while annotating.
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_CODEC.to_string(),
            pretty_json: false,
            progress: true,
        }
    }
}
