//! Nullable backend: scripted REST responses with request counting.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use facepass_client::{Backend, ClientError};
use facepass_types::{HandoverToken, ProviderProfile, Role, UserProfile};

/// An in-memory backend for testing.
///
/// Handover tokens are single-use like on the real server: the first
/// redemption consumes a token, later ones get HTTP 400.
pub struct NullBackend {
    user: Mutex<UserProfile>,
    provider: Mutex<Result<ProviderProfile, ClientError>>,
    images: Mutex<HashMap<String, Vec<u8>>>,
    user_errors: Mutex<VecDeque<ClientError>>,
    verified_on_call: Mutex<Option<usize>>,
    submit_error: Mutex<Option<ClientError>>,
    token_error: Mutex<Option<ClientError>>,
    issued: Mutex<Vec<String>>,
    live_tokens: Mutex<HashSet<String>>,
    latency: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    user_calls: AtomicUsize,
    provider_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    token_calls: AtomicUsize,
    redeem_calls: AtomicUsize,
    image_calls: AtomicUsize,
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            user: Mutex::new(UserProfile {
                id: "user-1".into(),
                name: "Test User".into(),
                email: "test@example.com".into(),
                ..Default::default()
            }),
            provider: Mutex::new(Err(ClientError::Http {
                status: 404,
                message: "Boyfriend profile not found".into(),
            })),
            images: Mutex::new(HashMap::new()),
            user_errors: Mutex::new(VecDeque::new()),
            verified_on_call: Mutex::new(None),
            submit_error: Mutex::new(None),
            token_error: Mutex::new(None),
            issued: Mutex::new(Vec::new()),
            live_tokens: Mutex::new(HashSet::new()),
            latency: Mutex::new(Duration::ZERO),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            user_calls: AtomicUsize::new(0),
            provider_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            token_calls: AtomicUsize::new(0),
            redeem_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
        }
    }

    /// Set the account photo URL and serve `bytes` at it.
    pub fn with_profile_photo(self, url: &str, bytes: Vec<u8>) -> Self {
        self.user.lock().unwrap().profile_image = Some(url.to_string());
        self.serve_image(url, bytes);
        self
    }

    /// Make the user a provider whose public profile has `photo`.
    pub fn as_provider(self, photo: Option<&str>) -> Self {
        self.user.lock().unwrap().role = Role::Provider;
        *self.provider.lock().unwrap() = Ok(ProviderProfile {
            profile_image: photo.map(str::to_string),
        });
        self
    }

    /// Make the provider-profile endpoint fail.
    pub fn with_provider_error(self, error: ClientError) -> Self {
        self.user.lock().unwrap().role = Role::Provider;
        *self.provider.lock().unwrap() = Err(error);
        self
    }

    pub fn serve_image(&self, url: &str, bytes: Vec<u8>) {
        self.images.lock().unwrap().insert(url.to_string(), bytes);
    }

    pub fn set_verified(&self, verified: bool) {
        self.user.lock().unwrap().is_verified = verified;
    }

    /// The `n`-th profile request (1-based) and all later ones see `isVerified`.
    pub fn verify_on_user_call(&self, n: usize) {
        *self.verified_on_call.lock().unwrap() = Some(n);
    }

    /// Fail the next profile requests with these errors, in order.
    pub fn fail_user_calls(&self, errors: impl IntoIterator<Item = ClientError>) {
        self.user_errors.lock().unwrap().extend(errors);
    }

    pub fn fail_submit(&self, error: ClientError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    pub fn recover_submit(&self) {
        self.submit_error.lock().unwrap().take();
    }

    pub fn fail_token_requests(&self, error: ClientError) {
        *self.token_error.lock().unwrap() = Some(error);
    }

    /// Delay every profile response by `latency` (tokio time).
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Register a redeemable token without going through `request_handover_token`.
    pub fn issue_token(&self, token: &str) {
        self.live_tokens.lock().unwrap().insert(token.to_string());
    }

    pub fn issued_tokens(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }

    pub fn user(&self) -> UserProfile {
        self.user.lock().unwrap().clone()
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn redeem_calls(&self) -> usize {
        self.redeem_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrently outstanding profile requests seen.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for NullBackend {
    async fn current_user(&self) -> Result<UserProfile, ClientError> {
        let call = self.user_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = self.user_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        if let Some(n) = *self.verified_on_call.lock().unwrap() {
            if call >= n {
                self.set_verified(true);
            }
        }
        Ok(self.user.lock().unwrap().clone())
    }

    async fn provider_profile(&self) -> Result<ProviderProfile, ClientError> {
        self.provider_calls.fetch_add(1, Ordering::SeqCst);
        self.provider.lock().unwrap().clone()
    }

    async fn submit_verification(&self) -> Result<(), ClientError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.submit_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.set_verified(true);
        Ok(())
    }

    async fn request_handover_token(&self) -> Result<HandoverToken, ClientError> {
        let n = self.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.token_error.lock().unwrap().clone() {
            return Err(err);
        }
        let raw = format!("handover-token-{n}");
        self.issued.lock().unwrap().push(raw.clone());
        self.live_tokens.lock().unwrap().insert(raw.clone());
        HandoverToken::new(raw).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn redeem_handover_token(
        &self,
        token: &HandoverToken,
    ) -> Result<UserProfile, ClientError> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        if self.live_tokens.lock().unwrap().remove(token.as_str()) {
            Ok(self.user.lock().unwrap().clone())
        } else {
            Err(ClientError::Http {
                status: 400,
                message: "Invalid or expired token".into(),
            })
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.images
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ClientError::Http {
                status: 404,
                message: format!("no image at {url}"),
            })
    }
}
