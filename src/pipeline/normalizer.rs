//! Conversion of raw tracked results into document detections.

use crate::constants::{PERSON_CLASS_ID, PERSON_LABEL};
use crate::error::{Error, Result};
use crate::inference::RawDetections;
use crate::output::{Detection, Keypoint};

/// Convert one frame's raw detections into person detections.
///
/// Only class 0 (COCO person) survives; a frame without class data is
/// treated as all-person. Optional attributes stay optional: a missing
/// track id, score or keypoint confidence is carried as `None` and never
/// replaced by a placeholder. Keypoint order is kept as reported.
pub fn normalize_frame(raw: &RawDetections) -> Result<Vec<Detection>> {
    check_shape(raw)?;

    let mut detections = Vec::new();
    for (i, bbox) in raw.boxes_xyxy.iter().enumerate() {
        let class_id = raw.classes.as_ref().map_or(PERSON_CLASS_ID, |c| c[i]);
        if class_id != PERSON_CLASS_ID {
            continue;
        }

        let keypoints = raw.keypoints.as_ref().map_or_else(Vec::new, |kpts| {
            let conf = kpts.conf.as_ref().map(|c| c[i].as_slice());
            kpts.xy[i]
                .iter()
                .enumerate()
                .map(|(j, &[x, y])| Keypoint {
                    x,
                    y,
                    c: conf.map(|c| c[j]),
                })
                .collect()
        });

        detections.push(Detection {
            track_id: raw.track_ids.as_ref().and_then(|ids| ids[i]),
            bbox_xyxy: *bbox,
            score: raw.confidences.as_ref().map(|c| c[i]),
            class: PERSON_LABEL.to_string(),
            keypoints,
        });
    }

    Ok(detections)
}

/// Every per-detection array must have one entry per box.
fn check_shape(raw: &RawDetections) -> Result<()> {
    let expected = raw.boxes_xyxy.len();

    let check = |field: &'static str, actual: Option<usize>| match actual {
        Some(actual) if actual != expected => Err(Error::DetectionShapeMismatch {
            field,
            expected,
            actual,
        }),
        _ => Ok(()),
    };

    check("classes", raw.classes.as_ref().map(Vec::len))?;
    check("confidences", raw.confidences.as_ref().map(Vec::len))?;
    check("track_ids", raw.track_ids.as_ref().map(Vec::len))?;

    if let Some(kpts) = &raw.keypoints {
        check("keypoints", Some(kpts.xy.len()))?;
        if let Some(conf) = &kpts.conf {
            check("keypoint_confidences", Some(conf.len()))?;
            for (points, scores) in kpts.xy.iter().zip(conf) {
                if points.len() != scores.len() {
                    return Err(Error::DetectionShapeMismatch {
                        field: "keypoint_confidences",
                        expected: points.len(),
                        actual: scores.len(),
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::inference::RawKeypoints;

    fn person_box() -> [f32; 4] {
        [10.0, 10.0, 50.0, 50.0]
    }

    #[test]
    fn test_empty_frame() {
        let detections = normalize_frame(&RawDetections::default()).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_full_detection() {
        let raw = RawDetections {
            boxes_xyxy: vec![person_box()],
            classes: Some(vec![0]),
            confidences: Some(vec![0.9]),
            track_ids: Some(vec![Some(1)]),
            keypoints: Some(RawKeypoints {
                xy: vec![vec![[20.0, 15.0], [22.0, 14.0]]],
                conf: Some(vec![vec![0.8, 0.7]]),
            }),
        };

        let detections = normalize_frame(&raw).unwrap();
        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        assert_eq!(det.track_id, Some(1));
        assert_eq!(det.bbox_xyxy, person_box());
        assert_eq!(det.score, Some(0.9));
        assert_eq!(det.class, "person");
        assert_eq!(
            det.keypoints,
            vec![
                Keypoint {
                    x: 20.0,
                    y: 15.0,
                    c: Some(0.8)
                },
                Keypoint {
                    x: 22.0,
                    y: 14.0,
                    c: Some(0.7)
                },
            ]
        );
    }

    #[test]
    fn test_non_person_classes_are_dropped() {
        // A dog (COCO 16) next to a person.
        let raw = RawDetections {
            boxes_xyxy: vec![[0.0, 0.0, 5.0, 5.0], person_box()],
            classes: Some(vec![16, 0]),
            confidences: Some(vec![0.95, 0.6]),
            track_ids: Some(vec![Some(7), Some(8)]),
            keypoints: None,
        };

        let detections = normalize_frame(&raw).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].track_id, Some(8));
        assert_eq!(detections[0].bbox_xyxy, person_box());
    }

    #[test]
    fn test_missing_classes_means_person() {
        let raw = RawDetections {
            boxes_xyxy: vec![person_box(), person_box()],
            ..RawDetections::default()
        };

        let detections = normalize_frame(&raw).unwrap();
        assert_eq!(detections.len(), 2);
        assert!(detections.iter().all(|d| d.class == "person"));
    }

    #[test]
    fn test_absent_optional_fields_stay_absent() {
        let raw = RawDetections {
            boxes_xyxy: vec![person_box()],
            classes: Some(vec![0]),
            ..RawDetections::default()
        };

        let detections = normalize_frame(&raw).unwrap();
        assert_eq!(detections[0].track_id, None);
        assert_eq!(detections[0].score, None);
        assert!(detections[0].keypoints.is_empty());
    }

    #[test]
    fn test_partially_tracked_frame() {
        let raw = RawDetections {
            boxes_xyxy: vec![person_box(), person_box()],
            track_ids: Some(vec![None, Some(4)]),
            ..RawDetections::default()
        };

        let detections = normalize_frame(&raw).unwrap();
        assert_eq!(detections[0].track_id, None);
        assert_eq!(detections[1].track_id, Some(4));
    }

    #[test]
    fn test_keypoints_without_confidence_omit_it() {
        let raw = RawDetections {
            boxes_xyxy: vec![person_box()],
            keypoints: Some(RawKeypoints {
                xy: vec![vec![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]],
                conf: None,
            }),
            ..RawDetections::default()
        };

        let detections = normalize_frame(&raw).unwrap();
        let kps = &detections[0].keypoints;
        assert_eq!(kps.len(), 3);
        assert!(kps.iter().all(|k| k.c.is_none()));
        assert_eq!((kps[2].x, kps[2].y), (5.0, 6.0));
    }

    #[test]
    fn test_keypoint_set_count_mismatch() {
        let raw = RawDetections {
            boxes_xyxy: vec![person_box(), person_box()],
            keypoints: Some(RawKeypoints {
                xy: vec![vec![[1.0, 2.0]]],
                conf: None,
            }),
            ..RawDetections::default()
        };

        let err = normalize_frame(&raw).unwrap_err();
        assert!(matches!(
            err,
            Error::DetectionShapeMismatch {
                field: "keypoints",
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_attribute_length_mismatch() {
        let raw = RawDetections {
            boxes_xyxy: vec![person_box()],
            confidences: Some(vec![0.5, 0.4]),
            ..RawDetections::default()
        };

        assert!(matches!(
            normalize_frame(&raw),
            Err(Error::DetectionShapeMismatch {
                field: "confidences",
                ..
            })
        ));
    }

    #[test]
    fn test_keypoint_confidence_length_mismatch() {
        let raw = RawDetections {
            boxes_xyxy: vec![person_box()],
            keypoints: Some(RawKeypoints {
                xy: vec![vec![[1.0, 2.0], [3.0, 4.0]]],
                conf: Some(vec![vec![0.9]]),
            }),
            ..RawDetections::default()
        };

        assert!(matches!(
            normalize_frame(&raw),
            Err(Error::DetectionShapeMismatch {
                field: "keypoint_confidences",
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_mismatch_detected_even_when_all_filtered() {
        let raw = RawDetections {
            boxes_xyxy: vec![person_box()],
            classes: Some(vec![2]),
            track_ids: Some(vec![]),
            ..RawDetections::default()
        };

        assert!(normalize_frame(&raw).is_err());
    }
}
