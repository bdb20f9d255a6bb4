//! Video decoding and encoding through ffmpeg.

mod probe;
mod sink;
mod source;
mod stderr;

pub use probe::{VideoProperties, parse_frame_rate, probe_video};
pub use sink::{FfmpegSink, VideoSink};
pub use source::{FfmpegSource, FrameSource};
