//! End-to-end attempt scenarios wired with nullables.

use std::sync::Arc;
use std::time::Duration;

use facepass_client::ClientError;
use facepass_nullables::{
    descriptor, face_box, solid_png, FaceScript, NullArtifactSource, NullBackend, NullCamera,
    NullModelBackend,
};
use facepass_types::{FailureKind, Route};
use facepass_verification::{
    AttemptState, EngineConfig, Preparation, VerificationAttempt, VerificationEngine,
    VerificationError,
};

const PHOTO_URL: &str = "https://cdn.example/profile.jpg";

struct Harness {
    backend: Arc<NullBackend>,
    camera: NullCamera,
    script: FaceScript,
    engine: Arc<VerificationEngine>,
}

impl Harness {
    fn new(backend: NullBackend) -> Self {
        let script = FaceScript::new();
        script.add_face(&reference_png(), face_box(), 0.97, descriptor(0.0));
        let engine = VerificationEngine::new(
            EngineConfig::default(),
            Arc::new(NullArtifactSource::new()),
            Arc::new(NullModelBackend::new(script.clone())),
        )
        .unwrap();
        Self {
            backend: Arc::new(backend),
            camera: NullCamera::new(),
            script,
            engine: Arc::new(engine),
        }
    }

    fn with_photo() -> Self {
        Self::new(NullBackend::new().with_profile_photo(PHOTO_URL, reference_png()))
    }

    fn attempt(&self) -> VerificationAttempt {
        VerificationAttempt::new(
            self.engine.clone(),
            self.backend.clone(),
            Arc::new(self.camera.clone()),
        )
    }

    /// Queue a live frame whose face sits `offset` away from the reference.
    fn queue_face(&self, colour: [u8; 3], offset: f32) {
        let png = solid_png(colour);
        self.script.add_face(&png, face_box(), 0.9, descriptor(offset));
        self.camera.push_frame(png);
    }
}

fn reference_png() -> Vec<u8> {
    solid_png([200, 150, 120])
}

#[tokio::test]
async fn matching_face_is_accepted_and_reported() {
    let h = Harness::with_photo();
    h.queue_face([190, 140, 110], 0.3);
    let mut attempt = h.attempt();

    assert_eq!(attempt.status().message, "Loading models...");
    assert_eq!(attempt.prepare().await.unwrap(), Preparation::Ready);
    assert_eq!(attempt.state(), &AttemptState::Ready);
    assert_eq!(attempt.status().message, "Ready for Verification");
    assert_eq!(h.camera.opens(), 0);

    let decision = attempt.verify().await.unwrap();
    assert!(decision.accepted);
    assert!((decision.distance - 0.3).abs() < 1e-6);
    assert_eq!(attempt.state(), &AttemptState::Accepted);
    assert_eq!(attempt.status().message, "Verified! Redirecting...");
    assert_eq!(attempt.redirect().map(|r| r.route), Some(Route::Home));
    assert_eq!(h.backend.submit_calls(), 1);
    assert!(h.backend.user().is_verified);

    assert_eq!(h.camera.opens(), 1);
    assert_eq!(h.camera.stops(), 1);
    drop(attempt);
    assert_eq!(h.camera.stops(), 1);
}

#[tokio::test]
async fn missing_profile_photo_fails_before_camera_access() {
    let h = Harness::new(NullBackend::new());
    let mut attempt = h.attempt();

    let err = attempt.prepare().await.unwrap_err();
    assert!(matches!(err, VerificationError::NoProfilePhoto));
    assert_eq!(err.kind(), Some(FailureKind::ReferenceFetchFailed));
    assert_eq!(
        attempt.state(),
        &AttemptState::Error(FailureKind::ReferenceFetchFailed)
    );
    assert_eq!(
        attempt.status().message,
        "No profile image found. Please upload one first."
    );
    assert_eq!(h.camera.opens(), 0);
    assert_eq!(h.backend.image_calls(), 0);

    // Fatal: capture is refused.
    assert!(matches!(
        attempt.verify().await,
        Err(VerificationError::NotReady(_))
    ));
    assert_eq!(h.camera.opens(), 0);
}

#[tokio::test]
async fn rejection_is_retryable_and_hides_distance() {
    let h = Harness::with_photo();
    h.queue_face([10, 20, 30], 0.85);
    h.queue_face([11, 21, 31], 0.1);
    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();

    let first = attempt.verify().await.unwrap();
    assert!(!first.accepted);
    assert_eq!(attempt.state(), &AttemptState::Rejected);
    let status = attempt.status();
    assert_eq!(status.kind, Some(FailureKind::SimilarityRejected));
    assert_eq!(
        status.message,
        "Face does not match profile photo. Please try again."
    );
    assert!(!status.message.contains("0.8"));
    assert_eq!(h.backend.submit_calls(), 0);
    assert!(attempt.camera_active());

    let second = attempt.verify().await.unwrap();
    assert!(second.accepted);
    assert_eq!(attempt.rejections(), 1);
    assert_eq!(h.camera.opens(), 1);
    assert_eq!(h.camera.stops(), 1);
}

#[tokio::test]
async fn distance_at_threshold_rejects() {
    let h = Harness::with_photo();
    h.queue_face([10, 20, 30], 0.6);
    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();

    assert!(!attempt.verify().await.unwrap().accepted);
    assert_eq!(attempt.state(), &AttemptState::Rejected);
}

#[tokio::test]
async fn no_face_in_capture_allows_immediate_retry() {
    let h = Harness::with_photo();
    h.camera.push_frame(solid_png([0, 0, 0]));
    h.queue_face([190, 140, 110], 0.2);
    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();

    let err = attempt.verify().await.unwrap_err();
    assert!(matches!(err, VerificationError::NoFaceInCapture));
    assert_eq!(
        attempt.state(),
        &AttemptState::Error(FailureKind::NoFaceInCapture)
    );
    assert_eq!(
        attempt.status().message,
        "No face detected. Please ensure your face is clearly visible."
    );
    assert_eq!(attempt.rejections(), 0);

    assert!(attempt.verify().await.unwrap().accepted);
}

#[tokio::test]
async fn missing_screenshot_is_capture_failure() {
    let h = Harness::with_photo();
    h.camera.push_empty();
    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();

    let err = attempt.verify().await.unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::CaptureFailed));
    assert!(attempt.camera_active());
}

#[tokio::test]
async fn camera_permission_denied_is_capture_failure() {
    let h = Harness::with_photo();
    h.camera.fail_open();
    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();

    let err = attempt.verify().await.unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::CaptureFailed));
    assert!(!attempt.camera_active());
}

#[tokio::test]
async fn leaving_mid_capture_stops_camera_once() {
    let h = Harness::with_photo();
    h.camera.hang_on_grab();
    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();

    let task = tokio::spawn(async move {
        let _ = attempt.verify().await;
    });
    while h.camera.grabs() == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(h.camera.active_streams(), 1);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert_eq!(h.camera.opens(), 1);
    assert_eq!(h.camera.stops(), 1);
}

#[tokio::test]
async fn abandon_then_drop_stops_once() {
    let h = Harness::with_photo();
    h.queue_face([10, 20, 30], 0.9);
    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();
    attempt.verify().await.unwrap();

    attempt.abandon();
    drop(attempt);
    assert_eq!(h.camera.stops(), 1);
}

#[tokio::test]
async fn already_verified_user_skips_capture() {
    let h = Harness::with_photo();
    h.backend.set_verified(true);
    let mut attempt = h.attempt();

    assert_eq!(
        attempt.prepare().await.unwrap(),
        Preparation::AlreadyVerified
    );
    assert_eq!(attempt.state(), &AttemptState::Accepted);
    assert_eq!(h.backend.image_calls(), 0);
    assert_eq!(h.backend.submit_calls(), 0);
    assert_eq!(h.camera.opens(), 0);
}

#[tokio::test]
async fn provider_photo_is_the_reference() {
    let provider_url = "https://cdn.example/provider.jpg";
    let backend = NullBackend::new()
        .with_profile_photo(PHOTO_URL, solid_png([1, 1, 1]))
        .as_provider(Some(provider_url));
    backend.serve_image(provider_url, reference_png());
    let h = Harness::new(backend);
    h.queue_face([190, 140, 110], 0.1);

    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();
    assert_eq!(attempt.reference().unwrap().source.url(), provider_url);
    assert!(attempt.verify().await.unwrap().accepted);
}

#[tokio::test]
async fn submit_failure_is_retryable_without_new_camera() {
    let h = Harness::with_photo();
    h.queue_face([190, 140, 110], 0.1);
    h.backend.fail_submit(ClientError::Transport("offline".into()));
    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();

    let err = attempt.verify().await.unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::SubmitFailed));
    assert!(attempt.camera_active());
    assert!(!h.backend.user().is_verified);

    h.backend.recover_submit();
    h.queue_face([191, 141, 111], 0.1);
    assert!(attempt.verify().await.unwrap().accepted);
    assert_eq!(h.camera.opens(), 1);
    assert_eq!(h.camera.stops(), 1);
}

#[tokio::test]
async fn retry_after_error_reuses_cached_reference() {
    let h = Harness::with_photo();
    h.camera.push_frame(solid_png([0, 0, 0]));
    let mut attempt = h.attempt();
    attempt.prepare().await.unwrap();
    let _ = attempt.verify().await;

    attempt.prepare().await.unwrap();
    assert_eq!(attempt.state(), &AttemptState::Ready);
    assert_eq!(h.backend.image_calls(), 1);
    assert_eq!(h.engine.models().load_runs(), 1);
}

#[tokio::test]
async fn no_face_in_reference_halts() {
    let backend = NullBackend::new().with_profile_photo(PHOTO_URL, solid_png([5, 5, 5]));
    let h = Harness::new(backend);
    let mut attempt = h.attempt();

    let err = attempt.prepare().await.unwrap_err();
    assert!(matches!(err, VerificationError::NoFaceInReference));
    assert_eq!(
        attempt.status().message,
        "Could not detect a face in your profile photo."
    );
    assert!(matches!(
        attempt.verify().await,
        Err(VerificationError::NotReady(_))
    ));
}

#[tokio::test]
async fn verify_before_prepare_is_refused() {
    let h = Harness::with_photo();
    let mut attempt = h.attempt();
    assert!(matches!(
        attempt.verify().await,
        Err(VerificationError::NotReady(AttemptState::Idle))
    ));
    assert_eq!(h.camera.opens(), 0);
}
