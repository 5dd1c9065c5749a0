//! The backend operations the core flows depend on.

use async_trait::async_trait;
use facepass_types::{HandoverToken, ProviderProfile, UserProfile};

use crate::ClientError;

/// REST collaborator used by verification and handover.
///
/// All calls are authenticated by the device's current session except
/// [`Backend::redeem_handover_token`], which establishes one.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the signed-in user (photo URL, verification flag, role).
    async fn current_user(&self) -> Result<UserProfile, ClientError>;

    /// Fetch the provider profile of the signed-in user.
    async fn provider_profile(&self) -> Result<ProviderProfile, ClientError>;

    /// Mark the signed-in account as verified.
    async fn submit_verification(&self) -> Result<(), ClientError>;

    /// Ask for a one-time token another device can redeem.
    async fn request_handover_token(&self) -> Result<HandoverToken, ClientError>;

    /// Exchange a handover token for a session; returns the signed-in user.
    async fn redeem_handover_token(&self, token: &HandoverToken)
        -> Result<UserProfile, ClientError>;

    /// Download an image (profile photo) by absolute URL.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ClientError>;
}
