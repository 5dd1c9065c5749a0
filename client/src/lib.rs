//! Client side of the facepass backend.
//!
//! - [`Backend`]: the REST collaborator as seen by the verification and
//!   handover flows (profile, provider profile, verification submit, handover
//!   token issue and redemption, photo download).
//! - [`ApiClient`]: the `reqwest` implementation, cookie-session based.
//! - [`SessionStore`]: who is signed in on this device.

pub mod api;
pub mod backend;
pub mod error;
pub mod session;

pub use api::{ApiClient, DEFAULT_BACKEND_URL};
pub use backend::Backend;
pub use error::ClientError;
pub use session::SessionStore;
