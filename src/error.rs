//! Error types for posemark.

use std::path::PathBuf;

/// Result type alias for posemark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for posemark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// The frame source could not be opened.
    #[error("could not open video source '{path}': {reason}")]
    SourceUnavailable {
        /// Path to the video source.
        path: PathBuf,
        /// Why the source could not be opened.
        reason: String,
    },

    /// The video sink could not be created.
    #[error("could not create video output '{path}': {reason}")]
    SinkUnavailable {
        /// Path to the output video.
        path: PathBuf,
        /// Why the sink could not be created.
        reason: String,
    },

    /// Failed to read a frame from the decoder.
    #[error("failed to read frame {index} from '{path}': {reason}")]
    FrameRead {
        /// Path to the video source.
        path: PathBuf,
        /// Zero-based index of the frame being read.
        index: u64,
        /// Description of the read failure.
        reason: String,
    },

    /// Failed to hand a frame to the encoder.
    #[error("failed to write frame to '{path}': {reason}")]
    FrameWrite {
        /// Path to the output video.
        path: PathBuf,
        /// Encoder diagnostics, or the I/O error when the encoder printed none.
        reason: String,
    },

    /// The encoder exited unsuccessfully.
    #[error("video encoder for '{path}' failed: {reason}")]
    EncoderFailed {
        /// Path to the output video.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The detection collaborator returned per-detection arrays of different lengths.
    #[error("detection shape mismatch: {field} has {actual} entries, expected {expected}")]
    DetectionShapeMismatch {
        /// Name of the array that disagrees with the box count.
        field: &'static str,
        /// Number of entries implied by the boxes.
        expected: usize,
        /// Number of entries actually present.
        actual: usize,
    },

    /// A frame was appended out of order.
    #[error("frame sequence order violated: expected index {expected}, got {got}")]
    SequenceOrderViolation {
        /// Index the accumulator expected next.
        expected: u64,
        /// Index that was supplied.
        got: u64,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: PathBuf,
    },

    /// Failed to load the pose model.
    #[error("failed to load pose model '{path}': {reason}")]
    ModelLoad {
        /// Path to the model file.
        path: PathBuf,
        /// Description of the load failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Requested inference device is unavailable.
    #[error("inference device '{device}' is not available: {reason}")]
    DeviceUnavailable {
        /// Device selector as given.
        device: String,
        /// Description of the failure.
        reason: String,
    },

    /// Failed to read tracker configuration file.
    #[error("failed to read tracker config '{path}'")]
    TrackerConfigRead {
        /// Path to the tracker config.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse tracker configuration file.
    #[error("failed to parse tracker config '{path}'")]
    TrackerConfigParse {
        /// Path to the tracker config.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Tracker configuration values are out of range.
    #[error("invalid tracker config: {message}")]
    TrackerConfigInvalid {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write JSON output file.
    #[error("failed to write JSON output file '{path}'")]
    JsonWrite {
        /// Path to the JSON file.
        path: PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to persist JSON output file into place.
    #[error("failed to persist JSON output file '{path}'")]
    JsonPersist {
        /// Path to the JSON file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse an annotation document.
    #[error("failed to parse annotation document '{path}'")]
    JsonRead {
        /// Path to the JSON file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}
