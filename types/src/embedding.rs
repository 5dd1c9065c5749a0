//! Face embeddings and the distance metric used to compare them.
//!
//! An embedding is only meaningful inside the embedding space of the model
//! that produced it, so every embedding carries its [`ModelVersion`] and the
//! distance refuses to compare across versions.

use std::fmt;

use crate::error::TypesError;
use crate::model::ModelVersion;

/// Length of the descriptors produced by the recognition network.
pub const EMBEDDING_DIM: usize = 128;

/// A face descriptor produced by a recognition model from one detected face.
///
/// Held in memory only, by the verification attempt that computed it.
#[derive(Clone, PartialEq)]
pub struct FaceEmbedding {
    model: ModelVersion,
    values: Vec<f32>,
}

impl FaceEmbedding {
    /// Wrap raw descriptor values, rejecting empty or non-finite vectors.
    pub fn new(model: ModelVersion, values: Vec<f32>) -> Result<Self, TypesError> {
        if values.is_empty() {
            return Err(TypesError::EmptyEmbedding);
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(TypesError::NonFinite(idx));
        }
        Ok(Self { model, values })
    }

    pub fn model(&self) -> &ModelVersion {
        &self.model
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Euclidean distance to `other`. Lower means more similar.
    pub fn distance(&self, other: &FaceEmbedding) -> Result<f64, TypesError> {
        if self.model != other.model {
            return Err(TypesError::ModelMismatch {
                left: self.model.clone(),
                right: other.model.clone(),
            });
        }
        if self.values.len() != other.values.len() {
            return Err(TypesError::DimensionMismatch {
                left: self.values.len(),
                right: other.values.len(),
            });
        }
        let sum: f64 = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| {
                let d = f64::from(*a) - f64::from(*b);
                d * d
            })
            .sum();
        Ok(sum.sqrt())
    }
}

// Descriptor values are biometric data; keep them out of logs.
impl fmt::Debug for FaceEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceEmbedding")
            .field("model", &self.model)
            .field("len", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1() -> ModelVersion {
        ModelVersion::new("face-api.js/0.22.2")
    }

    #[test]
    fn distance_to_self_is_zero() {
        let e = FaceEmbedding::new(v1(), vec![0.25; EMBEDDING_DIM]).unwrap();
        assert_eq!(e.distance(&e).unwrap(), 0.0);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = FaceEmbedding::new(v1(), vec![0.0, 0.0]).unwrap();
        let b = FaceEmbedding::new(v1(), vec![3.0, 4.0]).unwrap();
        assert!((a.distance(&b).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn mixed_model_versions_are_refused() {
        let a = FaceEmbedding::new(v1(), vec![0.1; 4]).unwrap();
        let b = FaceEmbedding::new(ModelVersion::new("other/1.0"), vec![0.1; 4]).unwrap();
        assert!(matches!(
            a.distance(&b),
            Err(TypesError::ModelMismatch { .. })
        ));
    }

    #[test]
    fn mismatched_lengths_are_refused() {
        let a = FaceEmbedding::new(v1(), vec![0.1; 4]).unwrap();
        let b = FaceEmbedding::new(v1(), vec![0.1; 5]).unwrap();
        assert_eq!(
            a.distance(&b),
            Err(TypesError::DimensionMismatch { left: 4, right: 5 })
        );
    }

    #[test]
    fn empty_and_nan_vectors_rejected() {
        assert_eq!(
            FaceEmbedding::new(v1(), vec![]),
            Err(TypesError::EmptyEmbedding)
        );
        assert_eq!(
            FaceEmbedding::new(v1(), vec![0.0, f32::NAN]),
            Err(TypesError::NonFinite(1))
        );
    }

    #[test]
    fn debug_hides_values() {
        let e = FaceEmbedding::new(v1(), vec![0.123_456; 3]).unwrap();
        let rendered = format!("{e:?}");
        assert!(!rendered.contains("0.123"));
        assert!(rendered.contains("len: 3"));
    }
}
