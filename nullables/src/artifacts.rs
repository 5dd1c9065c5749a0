//! Nullable artifact source: synthetic weights, optional delay and failure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use facepass_types::{ModelKind, ModelSetSpec};
use facepass_verification::artifacts::{WeightGroup, WeightSpec};
use facepass_verification::{ArtifactSource, ModelArtifact, VerificationError};

/// Serves a one-tensor artifact per model without any I/O.
#[derive(Default)]
pub struct NullArtifactSource {
    delay: Mutex<Duration>,
    failing: Mutex<Option<ModelKind>>,
    fetches: Mutex<HashMap<ModelKind, usize>>,
    total: AtomicUsize,
}

impl NullArtifactSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long (tokio time) before answering each fetch.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    /// Fail fetches of `kind` with an HTTP-style error.
    pub fn fail(&self, kind: ModelKind) {
        *self.failing.lock().unwrap() = Some(kind);
    }

    pub fn recover(&self) {
        *self.failing.lock().unwrap() = None;
    }

    pub fn fetches_of(&self, kind: ModelKind) -> usize {
        self.fetches.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactSource for NullArtifactSource {
    async fn fetch(
        &self,
        spec: &ModelSetSpec,
        kind: ModelKind,
    ) -> Result<ModelArtifact, VerificationError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.fetches.lock().unwrap().entry(kind).or_default() += 1;

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *self.failing.lock().unwrap() == Some(kind) {
            return Err(VerificationError::ModelLoadFailed(format!(
                "{}: HTTP 404 Not Found",
                spec.file_url(kind.manifest_name())
            )));
        }

        Ok(ModelArtifact {
            kind,
            groups: vec![WeightGroup {
                paths: vec![format!("{kind}-shard1")],
                weights: vec![WeightSpec {
                    name: format!("{kind}/weights"),
                    shape: vec![4],
                    dtype: "float32".into(),
                    quantization: None,
                }],
            }],
            shards: vec![vec![0; 16]],
        })
    }
}
