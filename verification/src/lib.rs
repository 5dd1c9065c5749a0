//! Client-side biometric identity verification.
//!
//! Decides, with a numeric distance, whether a live camera capture shows the
//! same person as the account's stored profile photo:
//!
//! 1. **Models**: the detector, landmark, recognition and high-accuracy
//!    detector networks are loaded once per engine from one pinned
//!    [`ModelSetSpec`](facepass_types::ModelSetSpec).
//! 2. **Reference**: the profile photo is fetched, the most prominent face is
//!    embedded, and the result is cached for the attempt.
//! 3. **Capture**: a live frame is embedded with the real-time detector and
//!    compared against the reference under a [`MatchPolicy`].
//!
//! Inference itself is pluggable through [`ModelBackend`]; this crate owns
//! fetching, sequencing, selection, and the decision.

pub mod artifacts;
pub mod attempt;
pub mod camera;
pub mod engine;
pub mod error;
pub mod frame;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod reference;

pub use artifacts::{ArtifactSource, HttpArtifactSource, ModelArtifact, ModelArtifacts};
pub use attempt::{AttemptState, Preparation, VerificationAttempt};
pub use camera::{Camera, CameraError, CameraGuard, CaptureStream};
pub use engine::{EngineConfig, VerificationEngine};
pub use error::VerificationError;
pub use frame::Frame;
pub use loader::ModelHandle;
pub use models::{
    FaceDetector, FaceLandmarks, FaceRecognizer, InferenceError, LandmarkPredictor, ModelBackend,
    ModelSet,
};
pub use pipeline::{DetectorOptions, LIVE_INPUT_SIZE, LIVE_SCORE_THRESHOLD, REFERENCE_MIN_CONFIDENCE};
pub use policy::{MatchDecision, MatchPolicy, DEFAULT_MATCH_THRESHOLD};
pub use reference::{PhotoSource, ReferenceProfile};
