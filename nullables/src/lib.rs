//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the verification and handover flows sits
//! behind a trait. This crate provides test-friendly implementations that:
//! - Return scripted, deterministic values
//! - Count every call so tests can assert on request patterns
//! - Never touch the network, a camera, or real model weights
//!
//! Usage: swap real implementations for nullables in tests.

pub mod artifacts;
pub mod backend;
pub mod camera;
pub mod images;
pub mod models;

pub use artifacts::NullArtifactSource;
pub use backend::NullBackend;
pub use camera::NullCamera;
pub use images::solid_png;
pub use models::{descriptor, face_box, FaceScript, NullModelBackend};
