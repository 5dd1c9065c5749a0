//! Nullable face models: detections and descriptors scripted per image.
//!
//! Frames are identified by a hash of their decoded pixels, so a test can
//! say "this PNG contains a face here, with this descriptor" and every
//! detector, landmark and recognition call answers accordingly.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use facepass_types::{BoundingBox, Detection, ModelVersion, EMBEDDING_DIM};
use facepass_verification::{
    DetectorOptions, FaceDetector, FaceLandmarks, FaceRecognizer, Frame, InferenceError,
    LandmarkPredictor, ModelArtifacts, ModelBackend, ModelSet,
};

#[derive(Clone, Debug)]
struct ScriptedFace {
    detection: Detection,
    descriptor: Vec<f32>,
}

/// Which faces each image contains.
#[derive(Clone, Default)]
pub struct FaceScript {
    faces: Arc<Mutex<HashMap<u64, Vec<ScriptedFace>>>>,
}

impl FaceScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a face in the image encoded by `image_bytes`.
    pub fn add_face(&self, image_bytes: &[u8], bbox: BoundingBox, score: f64, descriptor: Vec<f32>) {
        let frame = Frame::decode(image_bytes).expect("scripted image must decode");
        self.faces
            .lock()
            .unwrap()
            .entry(fingerprint(&frame))
            .or_default()
            .push(ScriptedFace {
                detection: Detection::new(bbox, score),
                descriptor,
            });
    }

    fn faces_in(&self, frame: &Frame) -> Vec<ScriptedFace> {
        self.faces
            .lock()
            .unwrap()
            .get(&fingerprint(frame))
            .cloned()
            .unwrap_or_default()
    }
}

/// A 128-d descriptor at exactly `offset` Euclidean distance from `descriptor(0.0)`.
pub fn descriptor(offset: f32) -> Vec<f32> {
    let mut values = vec![0.0; EMBEDDING_DIM];
    values[0] = offset;
    values
}

/// A centred, comfortably large face box.
pub fn face_box() -> BoundingBox {
    BoundingBox::new(2.0, 2.0, 4.0, 4.0)
}

fn fingerprint(frame: &Frame) -> u64 {
    let mut hasher = DefaultHasher::new();
    frame.width().hash(&mut hasher);
    frame.height().hash(&mut hasher);
    frame.pixels().hash(&mut hasher);
    hasher.finish()
}

/// Builds [`ModelSet`]s that answer from a [`FaceScript`].
pub struct NullModelBackend {
    script: FaceScript,
    stamp: Option<ModelVersion>,
    failure: Option<String>,
    builds: AtomicUsize,
}

impl NullModelBackend {
    pub fn new(script: FaceScript) -> Self {
        Self {
            script,
            stamp: None,
            failure: None,
            builds: AtomicUsize::new(0),
        }
    }

    /// Build sets stamped with `version` regardless of the artifacts given.
    pub fn stamping(mut self, version: ModelVersion) -> Self {
        self.stamp = Some(version);
        self
    }

    /// Fail every build with `reason`.
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ModelBackend for NullModelBackend {
    fn name(&self) -> &str {
        "null-models"
    }

    fn build(&self, artifacts: ModelArtifacts) -> Result<ModelSet, InferenceError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            return Err(InferenceError(reason.clone()));
        }
        let version = self
            .stamp
            .clone()
            .unwrap_or_else(|| artifacts.version().clone());
        Ok(ModelSet::new(
            version,
            Box::new(NullDetector(self.script.clone())),
            Box::new(NullDetector(self.script.clone())),
            Box::new(NullLandmarks),
            Box::new(NullRecognizer(self.script.clone())),
        ))
    }
}

struct NullDetector(FaceScript);

impl FaceDetector for NullDetector {
    fn detect(
        &self,
        frame: &Frame,
        _options: &DetectorOptions,
    ) -> Result<Vec<Detection>, InferenceError> {
        Ok(self.0.faces_in(frame).into_iter().map(|f| f.detection).collect())
    }
}

struct NullLandmarks;

impl LandmarkPredictor for NullLandmarks {
    fn predict(&self, _frame: &Frame, face: &Detection) -> Result<FaceLandmarks, InferenceError> {
        let b = face.bbox;
        let centre = (b.x + b.width / 2.0, b.y + b.height / 2.0);
        Ok(FaceLandmarks {
            region: b,
            points: vec![centre; 68],
        })
    }
}

struct NullRecognizer(FaceScript);

impl FaceRecognizer for NullRecognizer {
    fn describe(
        &self,
        frame: &Frame,
        landmarks: &FaceLandmarks,
    ) -> Result<Vec<f32>, InferenceError> {
        self.0
            .faces_in(frame)
            .into_iter()
            .find(|f| f.detection.bbox == landmarks.region)
            .map(|f| f.descriptor)
            .ok_or_else(|| InferenceError("no scripted descriptor for region".into()))
    }
}
