//! One verification session, as a state machine.
//!
//! ```text
//! Idle → InitializingModels → FetchingReferencePhoto → ExtractingReferenceEmbedding
//!      → Ready → CapturingFrame → ExtractingLiveEmbedding → Comparing → Accepted | Rejected
//! ```
//!
//! `Error(kind)` is reachable from every step. Operations take `&mut self`,
//! so an attempt never runs two steps at once. The camera is opened on the
//! first capture and stopped on acceptance, on a fatal error, or when the
//! attempt is dropped.

use std::sync::Arc;

use facepass_client::Backend;
use facepass_types::{FailureKind, Redirect, StatusReport};

use crate::camera::{Camera, CameraGuard};
use crate::engine::VerificationEngine;
use crate::error::VerificationError;
use crate::frame::Frame;
use crate::policy::MatchDecision;
use crate::reference::{PhotoSource, ReferenceProfile};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    InitializingModels,
    FetchingReferencePhoto,
    ExtractingReferenceEmbedding,
    Ready,
    CapturingFrame,
    ExtractingLiveEmbedding,
    Comparing,
    Accepted,
    Rejected,
    Error(FailureKind),
}

/// How [`VerificationAttempt::prepare`] finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preparation {
    /// Reference is built; capture may start.
    Ready,
    /// The account was already verified; nothing to do.
    AlreadyVerified,
}

pub struct VerificationAttempt {
    engine: Arc<VerificationEngine>,
    backend: Arc<dyn Backend>,
    camera: Arc<dyn Camera>,
    state: AttemptState,
    reference: Option<ReferenceProfile>,
    stream: Option<CameraGuard>,
    rejections: u32,
    last_error: Option<&'static str>,
}

impl VerificationAttempt {
    pub fn new(
        engine: Arc<VerificationEngine>,
        backend: Arc<dyn Backend>,
        camera: Arc<dyn Camera>,
    ) -> Self {
        Self {
            engine,
            backend,
            camera,
            state: AttemptState::Idle,
            reference: None,
            stream: None,
            rejections: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn reference(&self) -> Option<&ReferenceProfile> {
        self.reference.as_ref()
    }

    /// Similarity rejections so far. Capping retries is up to the caller.
    pub fn rejections(&self) -> u32 {
        self.rejections
    }

    pub fn camera_active(&self) -> bool {
        self.stream.as_ref().is_some_and(CameraGuard::is_active)
    }

    /// Where to send the user once the attempt has been accepted.
    pub fn redirect(&self) -> Option<Redirect> {
        (self.state == AttemptState::Accepted).then(Redirect::home_after_verified)
    }

    /// Load models and build the reference embedding.
    ///
    /// Callable again after an error to retry the failed step; a reference
    /// already built for the same photo URL is reused.
    pub async fn prepare(&mut self) -> Result<Preparation, VerificationError> {
        match self.state {
            AttemptState::Idle | AttemptState::Error(_) => {}
            AttemptState::Ready | AttemptState::Rejected => return Ok(Preparation::Ready),
            ref other => return Err(VerificationError::NotReady(other.clone())),
        }
        self.last_error = None;

        self.enter(AttemptState::InitializingModels);
        if let Err(e) = self.engine.initialize().await {
            return Err(self.fail(e));
        }

        self.enter(AttemptState::FetchingReferencePhoto);
        let user = match self.backend.current_user().await {
            Ok(user) => user,
            Err(e) => return Err(self.fail(VerificationError::ReferenceFetchFailed(e.to_string()))),
        };
        if user.is_verified {
            tracing::info!(user_id = %user.id, "account already verified");
            self.release_camera();
            self.enter(AttemptState::Accepted);
            return Ok(Preparation::AlreadyVerified);
        }
        let source = match PhotoSource::resolve(self.backend.as_ref(), &user).await {
            Ok(source) => source,
            Err(e) => return Err(self.fail(e)),
        };

        let cached = self
            .reference
            .as_ref()
            .is_some_and(|r| r.source.url() == source.url());
        if !cached {
            self.reference = None;
            self.enter(AttemptState::ExtractingReferenceEmbedding);
            match self.engine.build_reference(self.backend.as_ref(), source).await {
                Ok(reference) => self.reference = Some(reference),
                Err(e) => return Err(self.fail(e)),
            }
        }

        self.enter(AttemptState::Ready);
        Ok(Preparation::Ready)
    }

    /// Capture a live frame and compare it against the reference.
    ///
    /// On acceptance the server is told before the state becomes `Accepted`.
    /// A rejection leaves the attempt retryable.
    pub async fn verify(&mut self) -> Result<MatchDecision, VerificationError> {
        let retryable = match &self.state {
            AttemptState::Ready | AttemptState::Rejected => true,
            AttemptState::Error(kind) => kind.is_recoverable(),
            _ => false,
        };
        if !retryable || self.reference.is_none() {
            return Err(VerificationError::NotReady(self.state.clone()));
        }
        self.last_error = None;

        self.enter(AttemptState::CapturingFrame);
        let frame = match self.capture().await {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e)),
        };

        self.enter(AttemptState::ExtractingLiveEmbedding);
        let live = match self.engine.extract_live(&frame).await {
            Ok(live) => live,
            Err(e) => return Err(self.fail(e)),
        };

        self.enter(AttemptState::Comparing);
        let decision = match self.reference.as_ref() {
            Some(reference) => self.engine.compare(reference, &live),
            None => Err(VerificationError::NotReady(self.state.clone())),
        };
        let decision = match decision {
            Ok(decision) => decision,
            Err(e) => return Err(self.fail(e)),
        };

        if !decision.accepted {
            self.rejections += 1;
            tracing::info!(rejections = self.rejections, "face did not match reference");
            self.enter(AttemptState::Rejected);
            return Ok(decision);
        }

        if let Err(e) = self.backend.submit_verification().await {
            return Err(self.fail(VerificationError::SubmitFailed(e.user_message())));
        }
        self.release_camera();
        self.enter(AttemptState::Accepted);
        Ok(decision)
    }

    /// Stop the camera, e.g. when the user leaves the page.
    pub fn abandon(&mut self) {
        self.release_camera();
    }

    /// What to show the user right now.
    pub fn status(&self) -> StatusReport {
        match &self.state {
            AttemptState::Idle => StatusReport::info("Loading models..."),
            AttemptState::InitializingModels => StatusReport::info("Loading AI models..."),
            AttemptState::FetchingReferencePhoto => StatusReport::info("Fetching profile..."),
            AttemptState::ExtractingReferenceEmbedding => {
                StatusReport::info("Processing profile photo...")
            }
            AttemptState::Ready => StatusReport::info("Ready for Verification"),
            AttemptState::CapturingFrame
            | AttemptState::ExtractingLiveEmbedding
            | AttemptState::Comparing => StatusReport::info("Verifying..."),
            AttemptState::Accepted => StatusReport::info("Verified! Redirecting..."),
            AttemptState::Rejected => StatusReport::failure(
                FailureKind::SimilarityRejected,
                "Face does not match profile photo. Please try again.",
            ),
            AttemptState::Error(kind) => StatusReport::failure(
                *kind,
                self.last_error.unwrap_or("Verification failed."),
            ),
        }
    }

    async fn capture(&mut self) -> Result<Frame, VerificationError> {
        if !self.camera_active() {
            let guard = CameraGuard::acquire(self.camera.as_ref())
                .await
                .map_err(|e| VerificationError::CaptureFailed(e.to_string()))?;
            self.stream = Some(guard);
        }
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| VerificationError::CaptureFailed("camera unavailable".into()))?;

        let bytes = stream
            .grab()
            .await
            .map_err(|e| VerificationError::CaptureFailed(e.to_string()))?
            .ok_or_else(|| {
                VerificationError::CaptureFailed("Could not capture image from webcam.".into())
            })?;
        Frame::decode(&bytes)
            .map_err(|e| VerificationError::CaptureFailed(format!("undecodable frame: {e}")))
    }

    fn enter(&mut self, state: AttemptState) {
        tracing::debug!(from = ?self.state, to = ?state, "verification attempt transition");
        self.state = state;
    }

    fn fail(&mut self, error: VerificationError) -> VerificationError {
        let kind = error.kind().unwrap_or(FailureKind::CaptureFailed);
        if kind.is_recoverable() {
            tracing::info!(%kind, error = %error, "verification step failed, retry allowed");
        } else {
            tracing::error!(%kind, error = %error, "verification halted");
            self.release_camera();
        }
        self.last_error = Some(error.user_message());
        self.enter(AttemptState::Error(kind));
        error
    }

    fn release_camera(&mut self) {
        if let Some(mut guard) = self.stream.take() {
            guard.release();
        }
    }
}
