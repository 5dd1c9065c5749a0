//! Cross-device handover for facepass.
//!
//! A signed-in desktop asks the backend for a single-use token, shows it as a
//! QR code pointing at `<public url>/handover?t=<token>`, and polls the user's
//! profile until the phone has finished face verification. The phone side
//! extracts the token from the link and redeems it for a session.

pub mod code;
pub mod error;
pub mod poll;
pub mod redeem;

pub use code::{handover_route, render_handover_code, HandoverCode, HANDOVER_PATH, TOKEN_PARAM};
pub use error::HandoverError;
pub use poll::{
    PollHandle, PollOutcome, StatusPoller, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL,
};
pub use redeem::{extract_token, Redeemer};

use facepass_client::Backend;
use facepass_types::HandoverToken;

/// Ask the backend for a fresh handover token for the signed-in user.
///
/// Stateless; callers may retry after a failure.
pub async fn request_handover_token(backend: &dyn Backend) -> Result<HandoverToken, HandoverError> {
    match backend.request_handover_token().await {
        Ok(token) => {
            tracing::info!(token = ?token, "handover token issued");
            Ok(token)
        }
        Err(e) => {
            tracing::warn!(error = %e, "handover token request failed");
            Err(HandoverError::TokenRequestFailed(e.user_message()))
        }
    }
}
