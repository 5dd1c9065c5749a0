//! Fundamental types for facepass.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! face embeddings, detection geometry, server payloads, handover tokens, the
//! pinned model identity, failure kinds, and navigation outcomes.

pub mod embedding;
pub mod error;
pub mod geometry;
pub mod handover;
pub mod model;
pub mod route;
pub mod status;
pub mod user;

pub use embedding::{FaceEmbedding, EMBEDDING_DIM};
pub use error::TypesError;
pub use geometry::{BoundingBox, Detection};
pub use handover::HandoverToken;
pub use model::{
    ModelKind, ModelSetSpec, ModelVersion, DEFAULT_MODEL_BASE_URL, DEFAULT_MODEL_VERSION,
};
pub use route::{Redirect, Route};
pub use status::{FailureKind, StatusReport};
pub use user::{ProviderProfile, Role, UserProfile};
