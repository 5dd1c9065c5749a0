//! The verification engine: models, reference building, live comparison.

use std::sync::Arc;

use facepass_client::Backend;
use facepass_types::{FaceEmbedding, ModelSetSpec};

use crate::artifacts::ArtifactSource;
use crate::error::VerificationError;
use crate::frame::Frame;
use crate::loader::ModelHandle;
use crate::models::ModelBackend;
use crate::pipeline::{detect_single_face, DetectedFace, DetectorOptions};
use crate::policy::{MatchDecision, MatchPolicy, DEFAULT_MATCH_THRESHOLD};
use crate::reference::{PhotoSource, ReferenceProfile};

/// Tunables of a [`VerificationEngine`].
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub models: ModelSetSpec,
    pub match_threshold: f64,
    pub live_detector: DetectorOptions,
    pub reference_detector: DetectorOptions,
}

impl EngineConfig {
    /// Reject settings under which every comparison would be meaningless.
    pub fn validate(&self) -> Result<(), VerificationError> {
        let threshold = self.match_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(VerificationError::InvalidConfig(format!(
                "match threshold {threshold} must be a finite number above zero"
            )));
        }
        self.live_detector
            .validate()
            .map_err(|e| VerificationError::InvalidConfig(format!("live detector: {e}")))?;
        self.reference_detector
            .validate()
            .map_err(|e| VerificationError::InvalidConfig(format!("reference detector: {e}")))?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models: ModelSetSpec::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            live_detector: DetectorOptions::live(),
            reference_detector: DetectorOptions::reference(),
        }
    }
}

/// Compares live captures against a reference photo.
///
/// One engine per page lifetime: it owns the model handle, so models load
/// once no matter how many attempts run against it.
pub struct VerificationEngine {
    models: ModelHandle,
    policy: MatchPolicy,
    live_detector: DetectorOptions,
    reference_detector: DetectorOptions,
}

impl VerificationEngine {
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn ArtifactSource>,
        backend: Arc<dyn ModelBackend>,
    ) -> Result<Self, VerificationError> {
        config.validate()?;
        Ok(Self {
            models: ModelHandle::new(config.models, source, backend),
            policy: MatchPolicy::new(config.match_threshold),
            live_detector: config.live_detector,
            reference_detector: config.reference_detector,
        })
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn models(&self) -> &ModelHandle {
        &self.models
    }

    /// Load every model. Idempotent; concurrent calls share one load.
    pub async fn initialize(&self) -> Result<(), VerificationError> {
        self.models.get().await.map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.models.is_loaded()
    }

    /// Fetch the photo behind `source` and embed its most prominent face.
    pub async fn build_reference(
        &self,
        photos: &dyn Backend,
        source: PhotoSource,
    ) -> Result<ReferenceProfile, VerificationError> {
        let models = self.models.get().await?;

        let bytes = photos.fetch_image(source.url()).await.map_err(|e| {
            tracing::error!(url = source.url(), error = %e, "reference photo fetch failed");
            VerificationError::ReferenceFetchFailed(e.to_string())
        })?;
        let frame = Frame::decode(&bytes)
            .map_err(|e| VerificationError::ReferenceFetchFailed(format!("undecodable photo: {e}")))?;

        let face = detect_single_face(
            &models,
            models.reference_detector.as_ref(),
            &frame,
            &self.reference_detector,
        )
        .map_err(|e| VerificationError::ReferenceFetchFailed(format!("inference failed: {e}")))?
        .ok_or(VerificationError::NoFaceInReference)?;

        tracing::info!(
            source = ?source,
            score = face.detection.score,
            "reference embedding ready"
        );
        let DetectedFace {
            detection,
            embedding,
        } = face;
        Ok(ReferenceProfile {
            source,
            detection,
            embedding,
        })
    }

    /// Embed the primary face of a live frame.
    pub async fn extract_live(&self, live_frame: &Frame) -> Result<FaceEmbedding, VerificationError> {
        let models = self.models.get().await?;
        let face = detect_single_face(
            &models,
            models.live_detector.as_ref(),
            live_frame,
            &self.live_detector,
        )
        .map_err(|e| VerificationError::CaptureFailed(format!("inference failed: {e}")))?
        .ok_or(VerificationError::NoFaceInCapture)?;
        Ok(face.embedding)
    }

    /// Distance of `live` to the reference, and the policy's decision on it.
    pub fn compare(
        &self,
        reference: &ReferenceProfile,
        live: &FaceEmbedding,
    ) -> Result<MatchDecision, VerificationError> {
        let distance = reference
            .embedding
            .distance(live)
            .map_err(|e| VerificationError::ModelMismatch(e.to_string()))?;
        let decision = self.policy.decide(distance);
        tracing::debug!(distance, accepted = decision.accepted, "face comparison");
        Ok(decision)
    }

    /// Embed `live_frame` and compare it to `reference`.
    pub async fn capture_and_compare(
        &self,
        reference: &ReferenceProfile,
        live_frame: &Frame,
    ) -> Result<MatchDecision, VerificationError> {
        let live = self.extract_live(live_frame).await?;
        self.compare(reference, &live)
    }
}
