use facepass_types::{FailureKind, Redirect};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandoverError {
    #[error("could not get a handover token: {0}")]
    TokenRequestFailed(String),
    #[error("handover token rejected: {0}")]
    TokenInvalid(String),
    #[error("no handover token in link")]
    MissingToken,
    #[error("public url is not configured")]
    ConfigurationMissing,
    #[error("invalid public url: {0}")]
    InvalidBaseUrl(String),
    #[error("qr encoding failed: {0}")]
    Encode(String),
}

impl HandoverError {
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            HandoverError::TokenRequestFailed(_) => Some(FailureKind::TokenRequestFailed),
            HandoverError::TokenInvalid(_) => Some(FailureKind::TokenInvalid),
            HandoverError::MissingToken => Some(FailureKind::MissingToken),
            HandoverError::ConfigurationMissing | HandoverError::InvalidBaseUrl(_) => {
                Some(FailureKind::ConfigurationMissing)
            }
            HandoverError::Encode(_) => None,
        }
    }

    /// Text for the status line on the phone or desktop.
    pub fn user_message(&self) -> String {
        match self {
            HandoverError::TokenRequestFailed(_) => "Failed to generate QR code".to_string(),
            HandoverError::TokenInvalid(message) => message.clone(),
            HandoverError::MissingToken => "Invalid or missing token.".to_string(),
            HandoverError::ConfigurationMissing | HandoverError::InvalidBaseUrl(_) => {
                "Handover link is not configured".to_string()
            }
            HandoverError::Encode(_) => "Failed to generate QR code".to_string(),
        }
    }

    /// Where a phone goes after a failed redemption.
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            HandoverError::MissingToken | HandoverError::TokenInvalid(_) => {
                Some(Redirect::login_fallback())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facepass_types::Route;

    #[test]
    fn redemption_failures_fall_back_to_login() {
        let err = HandoverError::TokenInvalid("Invalid or expired token".into());
        assert_eq!(err.redirect().map(|r| r.route), Some(Route::Login));
        assert_eq!(err.user_message(), "Invalid or expired token");
        assert_eq!(HandoverError::MissingToken.redirect().map(|r| r.route), Some(Route::Login));
        assert_eq!(HandoverError::TokenRequestFailed("x".into()).redirect(), None);
    }

    #[test]
    fn invalid_base_is_a_configuration_problem() {
        assert_eq!(
            HandoverError::InvalidBaseUrl("nope".into()).kind(),
            Some(FailureKind::ConfigurationMissing)
        );
        assert!(HandoverError::TokenRequestFailed("x".into())
            .kind()
            .is_some_and(|k| k.is_recoverable()));
    }
}
