//! Phone side: turn a scanned link into a signed-in session.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use facepass_client::{Backend, SessionStore};
use facepass_types::{HandoverToken, Redirect};
use reqwest::Url;

use crate::code::TOKEN_PARAM;
use crate::error::HandoverError;

/// Read the `t` parameter from a handover link.
///
/// Accepts absolute links as well as a bare path such as `/handover?t=...`.
pub fn extract_token(link: &str) -> Result<HandoverToken, HandoverError> {
    let parsed = match Url::parse(link) {
        Ok(url) => url,
        Err(_) => Url::parse("http://localhost/")
            .and_then(|base| base.join(link))
            .map_err(|_| HandoverError::MissingToken)?,
    };
    parsed
        .query_pairs()
        .find(|(key, _)| key == TOKEN_PARAM)
        .and_then(|(_, value)| HandoverToken::new(value.into_owned()).ok())
        .ok_or(HandoverError::MissingToken)
}

/// Redeems handover tokens and records the resulting session.
///
/// Each token is submitted at most once per redeemer, even when the same
/// link is opened twice concurrently.
pub struct Redeemer {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    submitted: Mutex<HashSet<HandoverToken>>,
}

impl Redeemer {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>) -> Self {
        Self {
            backend,
            session,
            submitted: Mutex::new(HashSet::new()),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Exchange `token` for a session. On success the user is stored and the
    /// phone should continue to the verification page.
    pub async fn redeem(&self, token: &HandoverToken) -> Result<Redirect, HandoverError> {
        let first_use = self
            .submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone());
        if !first_use {
            tracing::warn!(token = ?token, "handover token already submitted");
            return Err(HandoverError::TokenInvalid(
                "Invalid or expired token".to_string(),
            ));
        }

        let user = self.backend.redeem_handover_token(token).await.map_err(|e| {
            tracing::warn!(token = ?token, error = %e, "handover redemption rejected");
            HandoverError::TokenInvalid(e.user_message())
        })?;
        self.session.login(user);
        Ok(Redirect::verify_after_redeem())
    }

    /// [`extract_token`] followed by [`Redeemer::redeem`].
    pub async fn redeem_link(&self, link: &str) -> Result<Redirect, HandoverError> {
        let token = extract_token(link)?;
        self.redeem(&token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_from_absolute_link() {
        let token = extract_token("https://app.example/handover?t=abc123").unwrap();
        assert_eq!(token.as_str(), "abc123");
    }

    #[test]
    fn token_from_relative_link() {
        let token = extract_token("/handover?x=1&t=tok").unwrap();
        assert_eq!(token.as_str(), "tok");
    }

    #[test]
    fn missing_or_blank_token() {
        assert_eq!(
            extract_token("https://app.example/handover").unwrap_err(),
            HandoverError::MissingToken
        );
        assert_eq!(
            extract_token("https://app.example/handover?t=").unwrap_err(),
            HandoverError::MissingToken
        );
        assert_eq!(
            extract_token("https://app.example/handover?token=abc").unwrap_err(),
            HandoverError::MissingToken
        );
    }

    #[test]
    fn encoded_token_is_decoded() {
        let token = extract_token("https://app.example/handover?t=a+b%26c").unwrap();
        assert_eq!(token.as_str(), "a b&c");
    }
}
