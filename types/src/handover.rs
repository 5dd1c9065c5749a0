//! Single-use cross-device login token.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// An opaque, server-issued token identifying one pending cross-device login.
///
/// Expiry and single-use semantics are enforced by the server; the client
/// only displays or redeems it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HandoverToken(String);

impl HandoverToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyToken);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HandoverToken {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HandoverToken> for String {
    fn from(token: HandoverToken) -> Self {
        token.0
    }
}

impl fmt::Display for HandoverToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are bearer credentials; only show a prefix in debug output.
impl fmt::Debug for HandoverToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "HandoverToken({prefix}…)")
    }
}
