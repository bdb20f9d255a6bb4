//! Frame loop: render to the sink, normalize, accumulate, serialize.

use crate::error::Result;
use crate::inference::{
    ByteTracker, DetectorOptions, TrackedFrame, TrackedFrames, TrackerConfig, YoloPoseDetector,
};
use crate::output::progress::{self, ProgressGuard};
use crate::output::{AnnotationDocument, VideoMetadata, write_document};
use crate::pipeline::accumulator::FrameAccumulator;
use crate::pipeline::coordinator::{
    ProcessOptions, ensure_parent_dir, inference_size, video_metadata,
};
use crate::pipeline::normalizer::normalize_frame;
use crate::video::{FfmpegSink, FfmpegSource, FrameSource, VideoSink};
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Result of annotating one video.
#[derive(Debug)]
pub struct ProcessResult {
    /// Frames written to the video and the document.
    pub frames: usize,
    /// Person detections across all frames.
    pub detections: usize,
    /// Distinct track ids seen.
    pub tracks: usize,
    /// Processing duration in seconds.
    pub duration_secs: f64,
}

/// Annotate one video end to end with the ffmpeg and ONNX collaborators.
///
/// The source is opened before anything is created on disk, so an
/// unreadable input leaves no output behind.
pub fn process_video(options: &ProcessOptions) -> Result<ProcessResult> {
    let start_time = Instant::now();
    info!("Processing: {}", options.source.display());

    let source = FfmpegSource::open(&options.source)?;
    let properties = source.properties();
    let metadata = video_metadata(&options.source, &properties);

    let computed = inference_size(metadata.width, metadata.height);
    let imgsz = options.imgsz.unwrap_or(computed);
    debug!(
        "Video {}x{} @ {} fps, inference size {imgsz} (computed {computed})",
        metadata.width, metadata.height, metadata.fps
    );

    let tracker = ByteTracker::new(TrackerConfig::resolve(&options.tracker)?, metadata.fps);
    let detector = YoloPoseDetector::load(&options.model, options.device)?;

    ensure_parent_dir(&options.video_out)?;
    ensure_parent_dir(&options.json_out)?;
    let mut sink = FfmpegSink::create(
        &options.video_out,
        metadata.width,
        metadata.height,
        metadata.fps,
        &options.codec,
    )?;

    let detector_options = DetectorOptions {
        confidence: options.confidence,
        iou: options.iou,
        inference_size: imgsz,
        max_detections: options.max_detections,
    };
    let frames = TrackedFrames::new(source, detector, tracker, detector_options);

    let progress_bar =
        progress::create_frame_progress(properties.frame_count, &metadata.source, options.progress);
    let mut progress_guard = ProgressGuard::new(progress_bar, "Annotation complete");

    let document = run_annotation(
        &metadata,
        frames,
        &mut sink,
        &options.json_out,
        options.pretty_json,
        progress_guard.get(),
    )?;
    progress_guard.complete();
    drop(progress_guard);

    let duration_secs = start_time.elapsed().as_secs_f64();
    #[allow(clippy::cast_precision_loss)]
    let frames_per_sec = if duration_secs > 0.0 {
        document.frames.len() as f64 / duration_secs
    } else {
        0.0
    };
    let result = ProcessResult {
        frames: document.frames.len(),
        detections: document.detection_count(),
        tracks: document.track_count(),
        duration_secs,
    };
    info!(
        "Processed {} frames in {:.2}s ({:.1} frames/sec): {} detections, {} tracks",
        result.frames, duration_secs, frames_per_sec, result.detections, result.tracks
    );
    Ok(result)
}

/// Drive the frame loop and write the document once it completed.
///
/// Nothing is written to `json_path` when the loop fails.
pub fn run_annotation<I, K>(
    metadata: &VideoMetadata,
    frames: I,
    sink: &mut K,
    json_path: &Path,
    pretty: bool,
    progress: Option<&ProgressBar>,
) -> Result<AnnotationDocument>
where
    I: IntoIterator<Item = Result<TrackedFrame>>,
    K: VideoSink + ?Sized,
{
    let document = annotate_frames(metadata, frames, sink, progress)?;
    write_document(&document, json_path, pretty)?;
    info!(
        "Wrote {} frames to {}",
        document.frames.len(),
        json_path.display()
    );
    Ok(document)
}

/// Consume tracked frames in order, feeding the sink and building the document.
///
/// The sink is closed and the frame stream dropped on every path, in that
/// order. When the loop fails, a failure to close the sink is logged and the
/// loop's error is returned.
pub fn annotate_frames<I, K>(
    metadata: &VideoMetadata,
    frames: I,
    sink: &mut K,
    progress: Option<&ProgressBar>,
) -> Result<AnnotationDocument>
where
    I: IntoIterator<Item = Result<TrackedFrame>>,
    K: VideoSink + ?Sized,
{
    let mut frames = frames.into_iter();
    let outcome = drive(metadata, &mut frames, sink, progress);
    let closed = sink.finish();
    drop(frames);

    match (outcome, closed) {
        (Ok(document), Ok(())) => Ok(document),
        (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("Failed to close video output: {close_err}");
            Err(e)
        }
    }
}

fn drive<I, K>(
    metadata: &VideoMetadata,
    frames: &mut I,
    sink: &mut K,
    progress: Option<&ProgressBar>,
) -> Result<AnnotationDocument>
where
    I: Iterator<Item = Result<TrackedFrame>>,
    K: VideoSink + ?Sized,
{
    let mut accumulator = FrameAccumulator::new(metadata);

    for result in frames {
        let frame = result?;
        sink.write_frame(&frame.rendered)?;

        let detections = normalize_frame(&frame.detections)?;
        let index = accumulator.next_index();
        #[allow(clippy::cast_precision_loss)]
        let time = index as f64 / metadata.fps;
        trace!(
            "Frame {index} @ {time:.3}s: {} of {} detections kept",
            detections.len(),
            frame.detections.len()
        );

        accumulator.append(index, time, detections)?;
        progress::inc_progress(progress);
    }

    Ok(accumulator.finish())
}
