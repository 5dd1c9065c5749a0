//! The reference side of a comparison: which photo, and its embedding.

use facepass_client::Backend;
use facepass_types::{Detection, FaceEmbedding, Role, UserProfile};

use crate::error::VerificationError;

/// Where the reference photo comes from, resolved once per reference build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhotoSource {
    /// The account's own profile photo.
    Account { url: String },
    /// The photo on the provider's public profile.
    Provider { url: String },
}

impl PhotoSource {
    pub fn url(&self) -> &str {
        match self {
            PhotoSource::Account { url } | PhotoSource::Provider { url } => url,
        }
    }

    /// Pick the photo for `user`.
    ///
    /// Providers use their public profile photo when it has one; a failure to
    /// fetch that profile falls back to the account photo.
    pub async fn resolve(
        backend: &dyn Backend,
        user: &UserProfile,
    ) -> Result<Self, VerificationError> {
        let mut source = user
            .profile_image
            .clone()
            .map(|url| PhotoSource::Account { url });

        if user.role == Role::Provider {
            match backend.provider_profile().await {
                Ok(profile) => {
                    if let Some(url) = profile.profile_image {
                        source = Some(PhotoSource::Provider { url });
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not fetch provider profile, using account photo");
                }
            }
        }

        source.ok_or(VerificationError::NoProfilePhoto)
    }
}

/// A reference photo and the embedding of its most prominent face.
#[derive(Clone, Debug)]
pub struct ReferenceProfile {
    pub source: PhotoSource,
    pub detection: Detection,
    pub embedding: FaceEmbedding,
}
