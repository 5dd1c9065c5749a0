//! Detection → landmarks → descriptor for a single face.

use facepass_types::{Detection, FaceEmbedding};

use crate::frame::Frame;
use crate::models::{FaceDetector, InferenceError, ModelSet};

/// Input side the real-time detector scales frames to.
pub const LIVE_INPUT_SIZE: u32 = 512;

/// Minimum detection score on live frames.
pub const LIVE_SCORE_THRESHOLD: f64 = 0.5;

/// Minimum detection confidence on the reference photo.
pub const REFERENCE_MIN_CONFIDENCE: f64 = 0.5;

/// Detector configuration, one variant per detector network.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DetectorOptions {
    /// Real-time detector; `input_size` must be a multiple of 32.
    TinyFaceDetector { input_size: u32, score_threshold: f64 },
    /// High-accuracy detector for still, posed photos.
    SsdMobilenetV1 { min_confidence: f64 },
}

impl DetectorOptions {
    pub fn live() -> Self {
        DetectorOptions::TinyFaceDetector {
            input_size: LIVE_INPUT_SIZE,
            score_threshold: LIVE_SCORE_THRESHOLD,
        }
    }

    pub fn reference() -> Self {
        DetectorOptions::SsdMobilenetV1 {
            min_confidence: REFERENCE_MIN_CONFIDENCE,
        }
    }

    pub fn min_score(&self) -> f64 {
        match self {
            DetectorOptions::TinyFaceDetector {
                score_threshold, ..
            } => *score_threshold,
            DetectorOptions::SsdMobilenetV1 { min_confidence } => *min_confidence,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let score = self.min_score();
        if !(0.0..=1.0).contains(&score) {
            return Err(format!("detector threshold {score} is outside [0, 1]"));
        }
        if let DetectorOptions::TinyFaceDetector { input_size, .. } = self {
            if *input_size == 0 || input_size % 32 != 0 {
                return Err(format!(
                    "detector input size {input_size} is not a positive multiple of 32"
                ));
            }
        }
        Ok(())
    }
}

/// The face chosen in a frame together with its descriptor.
#[derive(Clone, Debug)]
pub struct DetectedFace {
    pub detection: Detection,
    pub embedding: FaceEmbedding,
}

/// The most prominent face: largest box, then higher score, then first seen.
/// Detections below `min_score` are ignored.
pub fn select_primary(detections: &[Detection], min_score: f64) -> Option<Detection> {
    let mut best: Option<Detection> = None;
    for candidate in detections.iter().filter(|d| d.score >= min_score) {
        let better = match &best {
            None => true,
            Some(current) => {
                let (a, b) = (candidate.bbox.area(), current.bbox.area());
                a > b || (a == b && candidate.score > current.score)
            }
        };
        if better {
            best = Some(*candidate);
        }
    }
    best
}

/// Run `detector`, keep the primary face, and describe it.
///
/// `Ok(None)` means no face passed the threshold.
pub fn detect_single_face(
    models: &ModelSet,
    detector: &dyn FaceDetector,
    frame: &Frame,
    options: &DetectorOptions,
) -> Result<Option<DetectedFace>, InferenceError> {
    let detections = detector.detect(frame, options)?;
    let Some(detection) = select_primary(&detections, options.min_score()) else {
        return Ok(None);
    };

    let landmarks = models.landmarks.predict(frame, &detection)?;
    let values = models.recognizer.describe(frame, &landmarks)?;
    let embedding = FaceEmbedding::new(models.version().clone(), values)
        .map_err(|e| InferenceError(format!("recognizer output rejected: {e}")))?;

    Ok(Some(DetectedFace {
        detection,
        embedding,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facepass_types::BoundingBox;

    fn det(w: f64, h: f64, score: f64) -> Detection {
        Detection::new(BoundingBox::new(0.0, 0.0, w, h), score)
    }

    #[test]
    fn picks_largest_box() {
        let faces = [det(10.0, 10.0, 0.99), det(40.0, 40.0, 0.7), det(20.0, 20.0, 0.9)];
        assert_eq!(select_primary(&faces, 0.5), Some(faces[1]));
    }

    #[test]
    fn equal_area_prefers_higher_score_then_first() {
        let faces = [det(10.0, 10.0, 0.6), det(10.0, 10.0, 0.8)];
        assert_eq!(select_primary(&faces, 0.5), Some(faces[1]));

        let first = Detection::new(BoundingBox::new(1.0, 0.0, 10.0, 10.0), 0.8);
        let second = Detection::new(BoundingBox::new(50.0, 0.0, 10.0, 10.0), 0.8);
        assert_eq!(select_primary(&[first, second], 0.5), Some(first));
    }

    #[test]
    fn below_threshold_ignored_even_if_larger() {
        let faces = [det(100.0, 100.0, 0.3), det(10.0, 10.0, 0.6)];
        assert_eq!(select_primary(&faces, 0.5), Some(faces[1]));
        assert_eq!(select_primary(&faces[..1], 0.5), None);
        assert_eq!(select_primary(&[], 0.5), None);
    }

    #[test]
    fn options_validation() {
        assert!(DetectorOptions::live().validate().is_ok());
        assert!(DetectorOptions::reference().validate().is_ok());
        assert!(DetectorOptions::TinyFaceDetector {
            input_size: 500,
            score_threshold: 0.5
        }
        .validate()
        .is_err());
        assert!(DetectorOptions::SsdMobilenetV1 {
            min_confidence: 1.5
        }
        .validate()
        .is_err());
    }
}
