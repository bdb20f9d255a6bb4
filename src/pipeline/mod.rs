//! Annotation pipeline components.

mod accumulator;
mod coordinator;
mod normalizer;
mod processor;

pub use accumulator::FrameAccumulator;
pub use coordinator::{
    ProcessOptions, ensure_parent_dir, inference_size, resolve_fps, source_name, video_metadata,
};
pub use normalizer::normalize_frame;
pub use processor::{ProcessResult, annotate_frames, process_video, run_annotation};
