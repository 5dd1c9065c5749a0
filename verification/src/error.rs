use thiserror::Error;

use facepass_types::FailureKind;

use crate::attempt::AttemptState;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("no profile image found")]
    NoProfilePhoto,

    #[error("reference photo unavailable: {0}")]
    ReferenceFetchFailed(String),

    #[error("no face detected in the reference photo")]
    NoFaceInReference,

    #[error("no face detected in the captured frame")]
    NoFaceInCapture,

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("embedding comparison refused: {0}")]
    ModelMismatch(String),

    #[error("could not record verification: {0}")]
    SubmitFailed(String),

    #[error("operation not allowed in state {0:?}")]
    NotReady(AttemptState),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

impl VerificationError {
    /// Machine-readable kind; `None` for caller misuse.
    pub fn kind(&self) -> Option<FailureKind> {
        let kind = match self {
            VerificationError::ModelLoadFailed(_) | VerificationError::ModelMismatch(_) => {
                FailureKind::ModelLoadFailed
            }
            VerificationError::NoProfilePhoto | VerificationError::ReferenceFetchFailed(_) => {
                FailureKind::ReferenceFetchFailed
            }
            VerificationError::NoFaceInReference => FailureKind::NoFaceInReference,
            VerificationError::NoFaceInCapture => FailureKind::NoFaceInCapture,
            VerificationError::CaptureFailed(_) => FailureKind::CaptureFailed,
            VerificationError::SubmitFailed(_) => FailureKind::SubmitFailed,
            VerificationError::InvalidConfig(_) => FailureKind::ConfigurationMissing,
            VerificationError::NotReady(_) => return None,
        };
        Some(kind)
    }

    /// Short text suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            VerificationError::ModelLoadFailed(_) | VerificationError::ModelMismatch(_) => {
                "Error loading AI models."
            }
            VerificationError::NoProfilePhoto => {
                "No profile image found. Please upload one first."
            }
            VerificationError::ReferenceFetchFailed(_) => "Could not load your profile photo.",
            VerificationError::NoFaceInReference => {
                "Could not detect a face in your profile photo."
            }
            VerificationError::NoFaceInCapture => {
                "No face detected. Please ensure your face is clearly visible."
            }
            VerificationError::CaptureFailed(_) => {
                "Could not capture image from webcam. Please try again."
            }
            VerificationError::SubmitFailed(_) => "Verification failed.",
            VerificationError::NotReady(_) => "Verification is not ready yet.",
            VerificationError::InvalidConfig(_) => "Verification is not configured correctly.",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind().map(|k| k.is_recoverable()).unwrap_or(true)
    }
}
