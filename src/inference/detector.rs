//! YOLO pose detector backed by ONNX Runtime.

use crate::config::InferenceDevice;
use crate::constants::pose::{INPUT_NAME, KEYPOINT_DIMS, NUM_KEYPOINTS};
use crate::error::{Error, Result};
use crate::inference::boxes::non_max_suppression;
use crate::inference::letterbox::{Letterbox, letterbox, to_chw};
use crate::inference::types::PoseDetection;
use image::RgbImage;
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::Tensor;
use std::path::Path;
use tracing::{debug, info, trace};

/// Per-frame detection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
    /// Minimum class confidence.
    pub confidence: f32,
    /// IoU threshold for non-maximum suppression.
    pub iou: f32,
    /// Square model input size in pixels.
    pub inference_size: u32,
    /// Maximum detections kept per frame.
    pub max_detections: usize,
}

/// Produces pose detections for one frame.
pub trait PoseDetector {
    /// Detect people (and any other model classes) in `frame`.
    fn detect(&mut self, frame: &RgbImage, options: &DetectorOptions) -> Result<Vec<PoseDetection>>;
}

/// Keypoint layout of a pose model's output rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoseLayout {
    /// Keypoints per detection.
    pub num_keypoints: usize,
    /// Values per keypoint: 2 (x, y) or 3 (x, y, confidence).
    pub keypoint_dims: usize,
}

impl Default for PoseLayout {
    fn default() -> Self {
        Self {
            num_keypoints: NUM_KEYPOINTS,
            keypoint_dims: KEYPOINT_DIMS,
        }
    }
}

impl PoseLayout {
    fn keypoint_channels(self) -> usize {
        self.num_keypoints * self.keypoint_dims
    }
}

/// YOLOv8-style pose model (`[1, 4 + classes + keypoints, anchors]` output).
pub struct YoloPoseDetector {
    session: Session,
    layout: PoseLayout,
}

impl YoloPoseDetector {
    /// Load an ONNX model and bind it to `device`.
    pub fn load(model: &Path, device: InferenceDevice) -> Result<Self> {
        if !model.is_file() {
            return Err(Error::ModelFileNotFound {
                path: model.to_path_buf(),
            });
        }
        let load_err = |reason: String| Error::ModelLoad {
            path: model.to_path_buf(),
            reason,
        };

        let builder = Session::builder()
            .map_err(|e| load_err(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_err(e.to_string()))?;
        let (mut builder, device_name) = configure_device(builder, device)?;
        let session = builder
            .commit_from_file(model)
            .map_err(|e| load_err(e.to_string()))?;

        info!("Loaded model: {}, device: {device_name}", model.display());
        Ok(Self {
            session,
            layout: PoseLayout::default(),
        })
    }
}

impl PoseDetector for YoloPoseDetector {
    fn detect(&mut self, frame: &RgbImage, options: &DetectorOptions) -> Result<Vec<PoseDetection>> {
        let size = options.inference_size as usize;
        let (input, mapping) = letterbox(frame, options.inference_size);
        let tensor = Tensor::from_array(([1usize, 3, size, size], to_chw(&input)))
            .map_err(|e| inference_error(&e))?;

        let layout = self.layout;
        let outputs = self
            .session
            .run(ort::inputs![INPUT_NAME => tensor])
            .map_err(|e| inference_error(&e))?;
        let (shape, values) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error(&e))?;

        decode_output(values, &shape[..], layout, options, &mapping)
    }
}

fn inference_error(e: &dyn std::fmt::Display) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}

/// Register the execution provider for `device`.
///
/// `Auto` uses CUDA when the runtime offers it and falls back to CPU
/// silently; an explicit CUDA device fails when it is unavailable.
fn configure_device(
    builder: SessionBuilder,
    device: InferenceDevice,
) -> Result<(SessionBuilder, String)> {
    let cuda_available = CUDAExecutionProvider::default()
        .is_available()
        .unwrap_or(false);
    let register_err = |reason: String| Error::DeviceUnavailable {
        device: device.to_string(),
        reason,
    };

    match device {
        InferenceDevice::Cpu => {
            info!("Requested device: CPU");
            Ok((builder, "CPU".to_string()))
        }
        InferenceDevice::Auto => {
            if cuda_available {
                info!("Auto mode: CUDA available, attempting GPU");
                let builder = builder
                    .with_execution_providers([CUDAExecutionProvider::default().build()])
                    .map_err(|e| register_err(e.to_string()))?;
                Ok((builder, "CUDA".to_string()))
            } else {
                info!("Auto mode: No GPU providers available, using CPU");
                Ok((builder, "Auto (CPU)".to_string()))
            }
        }
        InferenceDevice::Cuda(index) => {
            if !cuda_available {
                return Err(register_err(
                    "CUDA execution provider is not available in the loaded ONNX Runtime"
                        .to_string(),
                ));
            }
            let device_id = i32::try_from(index)
                .map_err(|_| register_err(format!("device index {index} out of range")))?;
            info!("Requested device: CUDA:{index}");
            let provider = CUDAExecutionProvider::default()
                .with_device_id(device_id)
                .build()
                .error_on_failure();
            let builder = builder
                .with_execution_providers([provider])
                .map_err(|e| register_err(e.to_string()))?;
            Ok((builder, format!("CUDA:{index}")))
        }
    }
}

/// Decode a raw `[1, channels, anchors]` pose output into source-space detections.
pub fn decode_output(
    values: &[f32],
    shape: &[i64],
    layout: PoseLayout,
    options: &DetectorOptions,
    mapping: &Letterbox,
) -> Result<Vec<PoseDetection>> {
    let (channels, anchors) = match shape {
        [1, c, n] => (
            usize::try_from(*c).unwrap_or(0),
            usize::try_from(*n).unwrap_or(0),
        ),
        other => {
            return Err(Error::Inference {
                reason: format!("unexpected output shape {other:?}, expected [1, C, N]"),
            });
        }
    };
    if values.len() != channels * anchors {
        return Err(Error::Inference {
            reason: format!(
                "output holds {} values, shape implies {}",
                values.len(),
                channels * anchors
            ),
        });
    }
    let Some(num_classes) = channels
        .checked_sub(4 + layout.keypoint_channels())
        .filter(|&nc| nc > 0)
    else {
        return Err(Error::Inference {
            reason: format!(
                "output has {channels} channels, too few for {} keypoints",
                layout.num_keypoints
            ),
        });
    };

    let at = |row: usize, anchor: usize| values[row * anchors + anchor];

    let mut boxes = Vec::new();
    let mut scores = Vec::new();
    let mut classes = Vec::new();
    let mut anchor_ids = Vec::new();
    for a in 0..anchors {
        let (class_id, score) = (0..num_classes)
            .map(|c| (c, at(4 + c, a)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if score <= options.confidence {
            continue;
        }
        let (cx, cy, w, h) = (at(0, a), at(1, a), at(2, a), at(3, a));
        boxes.push([cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]);
        scores.push(score);
        classes.push(u32::try_from(class_id).unwrap_or(u32::MAX));
        anchor_ids.push(a);
    }

    let keep = non_max_suppression(
        &boxes,
        &scores,
        &classes,
        options.iou,
        options.max_detections,
    );
    trace!(
        "{} candidates above {:.2}, {} after NMS",
        boxes.len(),
        options.confidence,
        keep.len()
    );

    let kpt_base = 4 + num_classes;
    let detections = keep
        .into_iter()
        .map(|k| {
            let a = anchor_ids[k];
            let mut keypoints = Vec::with_capacity(layout.num_keypoints);
            let mut conf = Vec::with_capacity(layout.num_keypoints);
            for j in 0..layout.num_keypoints {
                let row = kpt_base + j * layout.keypoint_dims;
                keypoints.push(mapping.restore_point(at(row, a), at(row + 1, a)));
                if layout.keypoint_dims >= 3 {
                    conf.push(at(row + 2, a));
                }
            }
            PoseDetection {
                bbox: mapping.restore_box(&boxes[k]),
                score: scores[k],
                class_id: classes[k],
                keypoints,
                keypoint_conf: (layout.keypoint_dims >= 3).then_some(conf),
            }
        })
        .collect::<Vec<_>>();

    debug!("Decoded {} detections", detections.len());
    Ok(detections)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    const ANCHORS: usize = 3;

    fn options() -> DetectorOptions {
        DetectorOptions {
            confidence: 0.3,
            iou: 0.5,
            inference_size: 640,
            max_detections: 300,
        }
    }

    /// Output buffer with `classes` class rows and the COCO keypoint rows.
    fn output(classes: usize) -> (Vec<f32>, usize) {
        let channels = 4 + classes + NUM_KEYPOINTS * KEYPOINT_DIMS;
        (vec![0.0; channels * ANCHORS], channels)
    }

    fn set_anchor(
        values: &mut [f32],
        anchor: usize,
        cxcywh: [f32; 4],
        class_scores: &[f32],
        kpt_conf: f32,
    ) {
        let put = |values: &mut [f32], row: usize, v: f32| values[row * ANCHORS + anchor] = v;
        for (i, v) in cxcywh.into_iter().enumerate() {
            put(values, i, v);
        }
        for (i, &s) in class_scores.iter().enumerate() {
            put(values, 4 + i, s);
        }
        let base = 4 + class_scores.len();
        for j in 0..NUM_KEYPOINTS {
            put(values, base + j * 3, cxcywh[0] + j as f32);
            put(values, base + j * 3 + 1, cxcywh[1]);
            put(values, base + j * 3 + 2, kpt_conf);
        }
    }

    #[test]
    fn test_decode_filters_and_suppresses() {
        let (mut values, channels) = output(1);
        set_anchor(&mut values, 0, [100.0, 200.0, 40.0, 80.0], &[0.9], 0.8);
        set_anchor(&mut values, 1, [102.0, 201.0, 40.0, 80.0], &[0.8], 0.8);
        set_anchor(&mut values, 2, [400.0, 400.0, 40.0, 80.0], &[0.1], 0.8);

        let mapping = Letterbox::new(640, 640, 640);
        let shape = [1, channels as i64, ANCHORS as i64];
        let dets = decode_output(&values, &shape, PoseLayout::default(), &options(), &mapping)
            .unwrap();

        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        assert_eq!(d.bbox, [80.0, 160.0, 120.0, 240.0]);
        assert_eq!(d.score, 0.9);
        assert_eq!(d.class_id, 0);
        assert_eq!(d.keypoints.len(), NUM_KEYPOINTS);
        assert_eq!(d.keypoints[0], [100.0, 200.0]);
        assert_eq!(d.keypoints[16], [116.0, 200.0]);
        assert_eq!(d.keypoint_conf.as_ref().unwrap().len(), NUM_KEYPOINTS);
    }

    #[test]
    fn test_decode_maps_to_source_pixels() {
        let (mut values, channels) = output(1);
        set_anchor(&mut values, 0, [100.0, 240.0, 100.0, 100.0], &[0.9], 0.8);

        // 1280x720 into 640: gain 0.5, 140 px top padding.
        let mapping = Letterbox::new(1280, 720, 640);
        let shape = [1, channels as i64, ANCHORS as i64];
        let dets = decode_output(&values, &shape, PoseLayout::default(), &options(), &mapping)
            .unwrap();

        assert_eq!(dets[0].bbox, [100.0, 100.0, 300.0, 300.0]);
        assert_eq!(dets[0].keypoints[0], [200.0, 200.0]);
    }

    #[test]
    fn test_decode_picks_best_class() {
        let (mut values, channels) = output(2);
        set_anchor(&mut values, 0, [100.0, 200.0, 40.0, 80.0], &[0.2, 0.7], 0.8);

        let mapping = Letterbox::new(640, 640, 640);
        let shape = [1, channels as i64, ANCHORS as i64];
        let dets = decode_output(&values, &shape, PoseLayout::default(), &options(), &mapping)
            .unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert_eq!(dets[0].score, 0.7);
    }

    #[test]
    fn test_decode_without_keypoint_confidence() {
        let layout = PoseLayout {
            num_keypoints: 2,
            keypoint_dims: 2,
        };
        // 4 box rows, 1 class row, 2 keypoints x 2 values.
        let channels = 9;
        let mut values = vec![0.0; channels];
        values[..5].copy_from_slice(&[10.0, 10.0, 4.0, 4.0, 0.9]);
        values[5..].copy_from_slice(&[9.0, 9.0, 11.0, 11.0]);

        let mapping = Letterbox::new(640, 640, 640);
        let dets = decode_output(&values, &[1, 9, 1], layout, &options(), &mapping).unwrap();

        assert_eq!(dets[0].keypoints, vec![[9.0, 9.0], [11.0, 11.0]]);
        assert!(dets[0].keypoint_conf.is_none());
    }

    #[test]
    fn test_decode_empty_output() {
        let (values, channels) = output(1);
        let mapping = Letterbox::new(640, 640, 640);
        let shape = [1, channels as i64, ANCHORS as i64];
        let dets = decode_output(&values, &shape, PoseLayout::default(), &options(), &mapping)
            .unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        let mapping = Letterbox::new(640, 640, 640);
        let layout = PoseLayout::default();

        let result = decode_output(&[0.0; 30], &[1, 30, 1], layout, &options(), &mapping);
        assert!(matches!(result, Err(Error::Inference { .. })));

        let result = decode_output(&[0.0; 56], &[56, 1], layout, &options(), &mapping);
        assert!(matches!(result, Err(Error::Inference { .. })));

        let result = decode_output(&[0.0; 10], &[1, 56, 1], layout, &options(), &mapping);
        assert!(matches!(result, Err(Error::Inference { .. })));
    }

    #[test]
    fn test_load_missing_model() {
        let result = YoloPoseDetector::load(Path::new("/nonexistent/model.onnx"), InferenceDevice::Cpu);
        assert!(matches!(result, Err(Error::ModelFileNotFound { .. })));
    }
}
