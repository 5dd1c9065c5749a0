//! Where the caller should go next once a flow finishes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client routes the core flows can send the user to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Home,
    Verify,
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Verify => "/verify",
            Route::Login => "/login",
        }
    }
}

/// A navigation the UI performs after showing a status message for `after`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub route: Route,
    pub after: Duration,
}

impl Redirect {
    /// After a successful verification, on either device.
    pub const fn home_after_verified() -> Self {
        Self {
            route: Route::Home,
            after: Duration::from_millis(2000),
        }
    }

    /// After a mobile device redeemed a handover token.
    pub const fn verify_after_redeem() -> Self {
        Self {
            route: Route::Verify,
            after: Duration::from_millis(1000),
        }
    }

    /// After a failed or impossible redemption.
    pub const fn login_fallback() -> Self {
        Self {
            route: Route::Login,
            after: Duration::from_millis(3000),
        }
    }
}
