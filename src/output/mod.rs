//! Annotation document types, serialization and progress display.

mod json;
pub mod progress;
mod types;

pub use json::{read_document, write_document};
pub use types::{AnnotationDocument, Detection, FrameRecord, FrameSize, Keypoint, VideoMetadata};
