//! Append-only frame record log.

use crate::error::{Error, Result};
use crate::output::{AnnotationDocument, Detection, FrameRecord, VideoMetadata};

/// Collects frame records in pull order.
///
/// Indices must arrive as 0, 1, 2, ...; anything else means the frame loop
/// skipped or repeated a frame.
#[derive(Debug)]
pub struct FrameAccumulator {
    document: AnnotationDocument,
}

impl FrameAccumulator {
    /// Start an empty document for the given video.
    pub fn new(metadata: &VideoMetadata) -> Self {
        Self {
            document: AnnotationDocument::new(metadata),
        }
    }

    /// Index the next appended frame must carry.
    pub fn next_index(&self) -> u64 {
        self.document.frames.len() as u64
    }

    /// Append one frame record.
    pub fn append(&mut self, index: u64, time: f64, detections: Vec<Detection>) -> Result<()> {
        let expected = self.next_index();
        if index != expected {
            return Err(Error::SequenceOrderViolation {
                expected,
                got: index,
            });
        }

        self.document.frames.push(FrameRecord {
            index,
            time,
            detections,
        });
        Ok(())
    }

    /// Number of frames appended so far.
    pub fn len(&self) -> usize {
        self.document.frames.len()
    }

    /// Whether no frame has been appended.
    pub fn is_empty(&self) -> bool {
        self.document.frames.is_empty()
    }

    /// Close the log and hand out the finished document.
    pub fn finish(self) -> AnnotationDocument {
        self.document
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            source: "walk.mp4".to_string(),
            fps: 30.0,
            width: 1280,
            height: 720,
        }
    }

    #[test]
    fn test_sequential_appends() {
        let mut acc = FrameAccumulator::new(&metadata());
        assert!(acc.is_empty());

        for i in 0..4u64 {
            acc.append(i, i as f64 / 30.0, Vec::new()).unwrap();
        }
        assert_eq!(acc.len(), 4);

        let doc = acc.finish();
        assert_eq!(doc.source, "walk.mp4");
        assert_eq!(doc.fps, 30.0);
        let indices: Vec<u64> = doc.frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_first_index_must_be_zero() {
        let mut acc = FrameAccumulator::new(&metadata());
        let err = acc.append(1, 0.0, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::SequenceOrderViolation {
                expected: 0,
                got: 1
            }
        ));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_skipped_index_rejected() {
        let mut acc = FrameAccumulator::new(&metadata());
        acc.append(0, 0.0, Vec::new()).unwrap();
        assert!(matches!(
            acc.append(2, 0.0, Vec::new()),
            Err(Error::SequenceOrderViolation {
                expected: 1,
                got: 2
            })
        ));
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let mut acc = FrameAccumulator::new(&metadata());
        acc.append(0, 0.0, Vec::new()).unwrap();
        assert!(acc.append(0, 0.0, Vec::new()).is_err());
        assert_eq!(acc.len(), 1);
    }
}
