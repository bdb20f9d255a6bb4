//! Lazy per-frame detection, tracking and rendering.

use crate::error::Result;
use crate::inference::detector::{DetectorOptions, PoseDetector};
use crate::inference::render::render_overlay;
use crate::inference::tracker::Tracker;
use crate::inference::types::{PoseDetection, RawDetections, RawKeypoints, TrackedFrame};
use crate::video::FrameSource;
use tracing::trace;

/// Iterator of tracked frames pulled one at a time from a [`FrameSource`].
///
/// Each call to `next` decodes one frame, runs the detector and tracker on
/// it and draws the overlay. The first error ends the stream.
pub struct TrackedFrames<S, D, T> {
    source: S,
    detector: D,
    tracker: T,
    options: DetectorOptions,
    done: bool,
}

impl<S, D, T> TrackedFrames<S, D, T>
where
    S: FrameSource,
    D: PoseDetector,
    T: Tracker,
{
    /// Combine the collaborators into a stream.
    pub fn new(source: S, detector: D, tracker: T, options: DetectorOptions) -> Self {
        Self {
            source,
            detector,
            tracker,
            options,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<TrackedFrame>> {
        let Some(mut frame) = self.source.read_frame()? else {
            return Ok(None);
        };
        let detections = self.detector.detect(&frame, &self.options)?;
        let track_ids = self.tracker.update(&detections);
        trace!(
            "{} detections, {} tracked",
            detections.len(),
            track_ids.iter().flatten().count()
        );

        render_overlay(&mut frame, &detections, &track_ids);
        Ok(Some(TrackedFrame {
            rendered: frame,
            detections: to_raw(&detections, track_ids),
        }))
    }
}

impl<S, D, T> Iterator for TrackedFrames<S, D, T>
where
    S: FrameSource,
    D: PoseDetector,
    T: Tracker,
{
    type Item = Result<TrackedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Rearrange detections into per-attribute arrays.
///
/// Keypoint confidences are reported only when every detection carries them.
fn to_raw(detections: &[PoseDetection], track_ids: Vec<Option<u64>>) -> RawDetections {
    let conf: Option<Vec<Vec<f32>>> = detections
        .iter()
        .map(|d| d.keypoint_conf.clone())
        .collect();

    RawDetections {
        boxes_xyxy: detections.iter().map(|d| d.bbox).collect(),
        classes: Some(detections.iter().map(|d| d.class_id).collect()),
        confidences: Some(detections.iter().map(|d| d.score).collect()),
        track_ids: Some(track_ids),
        keypoints: Some(RawKeypoints {
            xy: detections.iter().map(|d| d.keypoints.clone()).collect(),
            conf,
        }),
    }
}
