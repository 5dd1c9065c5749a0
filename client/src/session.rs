//! Authenticated-user state for this device.

use std::sync::{PoisonError, RwLock};

use facepass_types::UserProfile;

/// Holds the user payload of the current session, if any.
#[derive(Default)]
pub struct SessionStore {
    user: RwLock<Option<UserProfile>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the authenticated state with the given user payload.
    pub fn login(&self, user: UserProfile) {
        tracing::info!(user_id = %user.id, "session established");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    pub fn logout(&self) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn current(&self) -> Option<UserProfile> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_then_logout() {
        let store = SessionStore::new();
        assert!(!store.is_authenticated());
        store.login(UserProfile {
            id: "u1".into(),
            ..Default::default()
        });
        assert_eq!(store.current().unwrap().id, "u1");
        store.logout();
        assert!(store.current().is_none());
    }
}
