//! One-time model loading.
//!
//! A [`ModelHandle`] is owned by its engine and loads the pinned set lazily,
//! at most once: concurrent callers of [`ModelHandle::get`] during the first
//! load all await that same load. A failed load leaves the handle empty so a
//! later call can try again.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;

use facepass_types::{ModelKind, ModelSetSpec};

use crate::artifacts::{ArtifactSource, ModelArtifacts};
use crate::error::VerificationError;
use crate::models::{ModelBackend, ModelSet};

pub struct ModelHandle {
    spec: ModelSetSpec,
    source: Arc<dyn ArtifactSource>,
    backend: Arc<dyn ModelBackend>,
    cell: OnceCell<Arc<ModelSet>>,
    load_runs: AtomicUsize,
}

impl ModelHandle {
    pub fn new(
        spec: ModelSetSpec,
        source: Arc<dyn ArtifactSource>,
        backend: Arc<dyn ModelBackend>,
    ) -> Self {
        Self {
            spec,
            source,
            backend,
            cell: OnceCell::new(),
            load_runs: AtomicUsize::new(0),
        }
    }

    pub fn spec(&self) -> &ModelSetSpec {
        &self.spec
    }

    /// The loaded set, loading it first if needed.
    pub async fn get(&self) -> Result<Arc<ModelSet>, VerificationError> {
        self.cell.get_or_try_init(|| self.load()).await.cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// How many times a load actually started (successful or not).
    pub fn load_runs(&self) -> usize {
        self.load_runs.load(Ordering::SeqCst)
    }

    async fn load(&self) -> Result<Arc<ModelSet>, VerificationError> {
        self.load_runs.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            version = %self.spec.version,
            backend = self.backend.name(),
            "loading face models"
        );

        let spec = &self.spec;
        let (tiny, landmarks, recognition, ssd) = tokio::try_join!(
            self.source.fetch(spec, ModelKind::TinyFaceDetector),
            self.source.fetch(spec, ModelKind::FaceLandmark68),
            self.source.fetch(spec, ModelKind::FaceRecognition),
            self.source.fetch(spec, ModelKind::SsdMobilenetV1),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "model artifact fetch failed");
            e
        })?;

        let artifacts =
            ModelArtifacts::new(spec.version.clone(), [tiny, landmarks, recognition, ssd])?;
        let set = self.backend.build(artifacts).map_err(|e| {
            tracing::error!(error = %e, "model backend failed to build networks");
            VerificationError::ModelLoadFailed(e.to_string())
        })?;

        if set.version() != &spec.version {
            return Err(VerificationError::ModelLoadFailed(format!(
                "backend built {} but {} is pinned",
                set.version(),
                spec.version
            )));
        }

        tracing::info!(version = %set.version(), "face models ready");
        Ok(Arc::new(set))
    }
}
