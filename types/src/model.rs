//! Pinned model identity.
//!
//! The four networks used by verification are published together; an engine
//! always loads all of them from a single [`ModelSetSpec`] so that every
//! embedding it produces lives in the same space.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default hosting location of the face-api weights.
pub const DEFAULT_MODEL_BASE_URL: &str = "https://justadudewhohacks.github.io/face-api.js/models";

/// Release the default hosting location serves.
pub const DEFAULT_MODEL_VERSION: &str = "face-api.js/0.22.2";

/// Identifier of a pinned model release.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelVersion(String);

impl ModelVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the networks the verification engine needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Fast detector used on live camera frames.
    TinyFaceDetector,
    /// 68-point landmark predictor used to align faces before embedding.
    FaceLandmark68,
    /// Recognition network producing 128-d descriptors.
    FaceRecognition,
    /// Slower, more accurate detector used on the reference photo.
    SsdMobilenetV1,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::TinyFaceDetector,
        ModelKind::FaceLandmark68,
        ModelKind::FaceRecognition,
        ModelKind::SsdMobilenetV1,
    ];

    /// File name of the weights manifest for this network.
    pub fn manifest_name(&self) -> &'static str {
        match self {
            ModelKind::TinyFaceDetector => "tiny_face_detector_model-weights_manifest.json",
            ModelKind::FaceLandmark68 => "face_landmark_68_model-weights_manifest.json",
            ModelKind::FaceRecognition => "face_recognition_model-weights_manifest.json",
            ModelKind::SsdMobilenetV1 => "ssd_mobilenetv1_model-weights_manifest.json",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::TinyFaceDetector => "tiny_face_detector",
            ModelKind::FaceLandmark68 => "face_landmark_68",
            ModelKind::FaceRecognition => "face_recognition",
            ModelKind::SsdMobilenetV1 => "ssd_mobilenetv1",
        };
        f.write_str(name)
    }
}

/// A version and the location its artifacts are served from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSetSpec {
    pub version: ModelVersion,
    pub base_url: String,
}

impl ModelSetSpec {
    pub fn new(version: ModelVersion, base_url: impl Into<String>) -> Self {
        Self {
            version,
            base_url: base_url.into(),
        }
    }

    /// Absolute URL of a file relative to the base location.
    pub fn file_url(&self, file: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), file)
    }
}

impl Default for ModelSetSpec {
    fn default() -> Self {
        Self::new(
            ModelVersion::new(DEFAULT_MODEL_VERSION),
            DEFAULT_MODEL_BASE_URL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_url_joins_without_double_slash() {
        let spec = ModelSetSpec::new(ModelVersion::new("v"), "https://models.example/");
        assert_eq!(
            spec.file_url(ModelKind::FaceRecognition.manifest_name()),
            "https://models.example/face_recognition_model-weights_manifest.json"
        );
    }

    #[test]
    fn manifest_names_are_distinct() {
        let mut names: Vec<_> = ModelKind::ALL.iter().map(|k| k.manifest_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }
}
