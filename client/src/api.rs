//! `reqwest` implementation of [`Backend`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, COOKIE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use facepass_types::{HandoverToken, ProviderProfile, UserProfile};

use crate::{Backend, ClientError};

/// Backend used when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// HTTP client for the facepass REST API.
///
/// Wraps `reqwest::Client` with the API base (`<backend>/api`) and a cookie
/// store, so a successful handover redemption leaves this client signed in.
/// An injected session cookie is only ever sent to API endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    session_cookie: Option<HeaderValue>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiClient {
    /// Create a client for the given backend (e.g. `http://localhost:3000`).
    pub fn new(backend_url: &str) -> Result<Self, ClientError> {
        Self::build(backend_url, None)
    }

    /// Create a client that sends an existing session cookie with every API
    /// request. Photo fetches never carry it.
    pub fn with_session_cookie(backend_url: &str, cookie: &str) -> Result<Self, ClientError> {
        let mut value = HeaderValue::from_str(cookie)
            .map_err(|e| ClientError::InvalidSessionCookie(e.to_string()))?;
        value.set_sensitive(true);
        Self::build(backend_url, Some(value))
    }

    fn build(backend_url: &str, session_cookie: Option<HeaderValue>) -> Result<Self, ClientError> {
        let api_base = api_base(backend_url)?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_base,
            session_cookie,
        })
    }

    /// The `<backend>/api` prefix every endpoint hangs off.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// A request to `<api_base><path>`, carrying the injected session cookie.
    fn api_request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let request = self.http.request(method, format!("{}{}", self.api_base, path));
        match &self.session_cookie {
            Some(cookie) => request.header(COOKIE, cookie.clone()),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Http {
            status: status.as_u16(),
            message: error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(self.api_request(Method::GET, path)).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn current_user(&self) -> Result<UserProfile, ClientError> {
        self.get_json("/users/profile").await
    }

    async fn provider_profile(&self) -> Result<ProviderProfile, ClientError> {
        self.get_json("/boyfriends/me").await
    }

    async fn submit_verification(&self) -> Result<(), ClientError> {
        self.send(self.api_request(Method::POST, "/users/verify"))
            .await?;
        Ok(())
    }

    async fn request_handover_token(&self) -> Result<HandoverToken, ClientError> {
        let resp: TokenResponse = self.get_json("/auth/mobile-handover").await?;
        HandoverToken::new(resp.token)
            .map_err(|e| ClientError::Decode(format!("/auth/mobile-handover: {e}")))
    }

    async fn redeem_handover_token(
        &self,
        token: &HandoverToken,
    ) -> Result<UserProfile, ClientError> {
        let request = self
            .api_request(Method::POST, "/auth/mobile-login")
            .json(&serde_json::json!({ "token": token.as_str() }));
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("/auth/mobile-login: {e}")))
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let url = reqwest::Url::parse(url).map_err(|e| ClientError::InvalidUrl(format!("{url}: {e}")))?;
        let bytes = self
            .send(self.http.get(url))
            .await?
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Normalise a backend URL into its API prefix.
fn api_base(backend_url: &str) -> Result<String, ClientError> {
    let trimmed = backend_url.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl(format!("{trimmed}: {e}")))?;
    Ok(format!("{trimmed}/api"))
}

/// Pull `message` out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}
