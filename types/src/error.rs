//! Error type for the shared facepass types.

use thiserror::Error;

use crate::model::ModelVersion;

#[derive(Debug, Error, PartialEq)]
pub enum TypesError {
    #[error("embeddings come from different model versions: {left} vs {right}")]
    ModelMismatch {
        left: ModelVersion,
        right: ModelVersion,
    },

    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("embedding must not be empty")]
    EmptyEmbedding,

    #[error("embedding contains a non-finite value at index {0}")]
    NonFinite(usize),

    #[error("handover token must not be empty")]
    EmptyToken,
}
