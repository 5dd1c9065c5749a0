//! Inference seams.
//!
//! The networks are opaque to the rest of the crate: a [`ModelBackend`] turns
//! fetched [`ModelArtifacts`] into a [`ModelSet`], and the set is then used
//! through the three traits below. Every set is stamped with the version of
//! the artifacts it was built from.

use std::fmt;

use thiserror::Error;

use facepass_types::{BoundingBox, Detection, ModelVersion};

use crate::artifacts::ModelArtifacts;
use crate::frame::Frame;
use crate::pipeline::DetectorOptions;

/// A network failed to build or to run.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct InferenceError(pub String);

/// 68-point facial landmarks for one detected face.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    /// The region the landmarks were predicted in.
    pub region: BoundingBox,
    /// `(x, y)` pixel coordinates, in the 68-point iBUG ordering.
    pub points: Vec<(f64, f64)>,
}

pub trait FaceDetector: Send + Sync {
    /// All faces found in `frame` under `options`.
    fn detect(
        &self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> Result<Vec<Detection>, InferenceError>;
}

pub trait LandmarkPredictor: Send + Sync {
    fn predict(&self, frame: &Frame, face: &Detection) -> Result<FaceLandmarks, InferenceError>;
}

pub trait FaceRecognizer: Send + Sync {
    /// Descriptor of the aligned face; length is model-defined (128 for face-api).
    fn describe(&self, frame: &Frame, landmarks: &FaceLandmarks)
        -> Result<Vec<f32>, InferenceError>;
}

/// Builds runnable networks from downloaded weights.
pub trait ModelBackend: Send + Sync {
    /// Human-readable name of this backend.
    fn name(&self) -> &str;

    fn build(&self, artifacts: ModelArtifacts) -> Result<ModelSet, InferenceError>;
}

/// The four networks of one pinned release.
pub struct ModelSet {
    version: ModelVersion,
    /// Real-time detector used on live frames.
    pub live_detector: Box<dyn FaceDetector>,
    /// High-accuracy detector used on the reference photo.
    pub reference_detector: Box<dyn FaceDetector>,
    pub landmarks: Box<dyn LandmarkPredictor>,
    pub recognizer: Box<dyn FaceRecognizer>,
}

impl ModelSet {
    pub fn new(
        version: ModelVersion,
        live_detector: Box<dyn FaceDetector>,
        reference_detector: Box<dyn FaceDetector>,
        landmarks: Box<dyn LandmarkPredictor>,
        recognizer: Box<dyn FaceRecognizer>,
    ) -> Self {
        Self {
            version,
            live_detector,
            reference_detector,
            landmarks,
            recognizer,
        }
    }

    pub fn version(&self) -> &ModelVersion {
        &self.version
    }
}

impl fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSet")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
