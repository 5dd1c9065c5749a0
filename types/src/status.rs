//! Machine-readable failure kinds and user-facing status reports.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every way the verification and handover flows can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ModelLoadFailed,
    ReferenceFetchFailed,
    NoFaceInReference,
    NoFaceInCapture,
    CaptureFailed,
    SimilarityRejected,
    SubmitFailed,
    TokenRequestFailed,
    TokenInvalid,
    MissingToken,
    ConfigurationMissing,
}

impl FailureKind {
    /// Whether the same step can be retried without the user changing
    /// anything outside the flow.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FailureKind::NoFaceInCapture
                | FailureKind::CaptureFailed
                | FailureKind::SimilarityRejected
                | FailureKind::SubmitFailed
                | FailureKind::TokenRequestFailed
                | FailureKind::TokenInvalid
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ModelLoadFailed => "model_load_failed",
            FailureKind::ReferenceFetchFailed => "reference_fetch_failed",
            FailureKind::NoFaceInReference => "no_face_in_reference",
            FailureKind::NoFaceInCapture => "no_face_in_capture",
            FailureKind::CaptureFailed => "capture_failed",
            FailureKind::SimilarityRejected => "similarity_rejected",
            FailureKind::SubmitFailed => "submit_failed",
            FailureKind::TokenRequestFailed => "token_request_failed",
            FailureKind::TokenInvalid => "token_invalid",
            FailureKind::MissingToken => "missing_token",
            FailureKind::ConfigurationMissing => "configuration_missing",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A short message for the user plus the failure kind, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub kind: Option<FailureKind>,
    pub message: String,
}

impl StatusReport {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_failures_are_fatal() {
        assert!(!FailureKind::ModelLoadFailed.is_recoverable());
        assert!(!FailureKind::ReferenceFetchFailed.is_recoverable());
        assert!(!FailureKind::NoFaceInReference.is_recoverable());
        assert!(FailureKind::NoFaceInCapture.is_recoverable());
        assert!(FailureKind::SimilarityRejected.is_recoverable());
    }

    #[test]
    fn serde_name_matches_as_str() {
        for kind in [FailureKind::TokenInvalid, FailureKind::NoFaceInCapture] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
