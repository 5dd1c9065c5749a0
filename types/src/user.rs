//! Server payloads describing the signed-in account.

use serde::{Deserialize, Serialize};

/// Account role as reported by the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    /// Listed companion; has a separate public profile with its own photo.
    #[serde(rename = "boyfriend", alias = "provider")]
    Provider,
    #[serde(other)]
    Other,
}

/// The current user as returned by the profile and login endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub role: Role,
}

/// Role-specific public profile of a provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub profile_image: Option<String>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
