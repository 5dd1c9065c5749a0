//! Fetching model weights.
//!
//! Each network is published as a weights manifest (a JSON array of weight
//! groups, each listing its tensors and the shard files holding them) plus
//! the shards. [`HttpArtifactSource`] downloads both from the pinned base URL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use facepass_types::{ModelKind, ModelSetSpec, ModelVersion};

use crate::error::VerificationError;

/// One tensor entry of a weights manifest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightSpec {
    pub name: String,
    #[serde(default)]
    pub shape: Vec<usize>,
    #[serde(default)]
    pub dtype: String,
    #[serde(default)]
    pub quantization: Option<serde_json::Value>,
}

/// A group of tensors stored across the listed shard files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightGroup {
    pub paths: Vec<String>,
    pub weights: Vec<WeightSpec>,
}

/// Manifest and shard bytes of one network.
#[derive(Clone, Debug)]
pub struct ModelArtifact {
    pub kind: ModelKind,
    pub groups: Vec<WeightGroup>,
    /// Shard contents, in manifest order.
    pub shards: Vec<Vec<u8>>,
}

impl ModelArtifact {
    pub fn byte_len(&self) -> usize {
        self.shards.iter().map(Vec::len).sum()
    }

    pub fn tensor_count(&self) -> usize {
        self.groups.iter().map(|g| g.weights.len()).sum()
    }
}

/// The complete set of artifacts for one pinned version.
#[derive(Debug)]
pub struct ModelArtifacts {
    version: ModelVersion,
    artifacts: HashMap<ModelKind, ModelArtifact>,
}

impl ModelArtifacts {
    /// Assemble a set, requiring exactly one artifact per [`ModelKind`].
    pub fn new(
        version: ModelVersion,
        artifacts: impl IntoIterator<Item = ModelArtifact>,
    ) -> Result<Self, VerificationError> {
        let mut map = HashMap::new();
        for artifact in artifacts {
            if map.insert(artifact.kind, artifact).is_some() {
                return Err(VerificationError::ModelLoadFailed(
                    "duplicate artifact in model set".into(),
                ));
            }
        }
        if let Some(missing) = ModelKind::ALL.iter().find(|k| !map.contains_key(k)) {
            return Err(VerificationError::ModelLoadFailed(format!(
                "model set is missing {missing}"
            )));
        }
        Ok(Self {
            version,
            artifacts: map,
        })
    }

    pub fn version(&self) -> &ModelVersion {
        &self.version
    }

    pub fn get(&self, kind: ModelKind) -> Option<&ModelArtifact> {
        self.artifacts.get(&kind)
    }

    /// Move one artifact out of the set.
    pub fn take(&mut self, kind: ModelKind) -> Option<ModelArtifact> {
        self.artifacts.remove(&kind)
    }

    pub fn byte_len(&self) -> usize {
        self.artifacts.values().map(ModelArtifact::byte_len).sum()
    }
}

/// Where model weights come from.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn fetch(
        &self,
        spec: &ModelSetSpec,
        kind: ModelKind,
    ) -> Result<ModelArtifact, VerificationError>;
}

/// Downloads manifests and shards over HTTP.
#[derive(Clone)]
pub struct HttpArtifactSource {
    http: reqwest::Client,
}

impl HttpArtifactSource {
    pub fn new() -> Result<Self, VerificationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                VerificationError::ModelLoadFailed(format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self { http })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, VerificationError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| VerificationError::ModelLoadFailed(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(VerificationError::ModelLoadFailed(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VerificationError::ModelLoadFailed(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ArtifactSource for HttpArtifactSource {
    async fn fetch(
        &self,
        spec: &ModelSetSpec,
        kind: ModelKind,
    ) -> Result<ModelArtifact, VerificationError> {
        let manifest_url = spec.file_url(kind.manifest_name());
        tracing::debug!(%kind, url = %manifest_url, "fetching weights manifest");

        let manifest = self.get_bytes(&manifest_url).await?;
        let groups = parse_manifest(&manifest)
            .map_err(|e| VerificationError::ModelLoadFailed(format!("{manifest_url}: {e}")))?;

        let mut shards = Vec::new();
        for path in groups.iter().flat_map(|g| g.paths.iter()) {
            shards.push(self.get_bytes(&spec.file_url(path)).await?);
        }

        let artifact = ModelArtifact {
            kind,
            groups,
            shards,
        };
        tracing::info!(%kind, bytes = artifact.byte_len(), "model artifact fetched");
        Ok(artifact)
    }
}

/// Parse and sanity-check a weights manifest.
pub fn parse_manifest(bytes: &[u8]) -> Result<Vec<WeightGroup>, String> {
    let groups: Vec<WeightGroup> = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    if groups.is_empty() {
        return Err("manifest lists no weight groups".into());
    }
    if groups.iter().any(|g| g.paths.is_empty()) {
        return Err("weight group without shard paths".into());
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"[{
        "weights": [
            {"name": "conv0/filters", "shape": [3, 3, 3, 16], "dtype": "float32"},
            {"name": "conv0/bias", "shape": [16], "dtype": "float32",
             "quantization": {"dtype": "uint8", "scale": 0.01, "min": -1.0}}
        ],
        "paths": ["tiny_face_detector_model-shard1"]
    }]"#;

    #[test]
    fn parses_face_api_manifest() {
        let groups = parse_manifest(MANIFEST.as_bytes()).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].paths, vec!["tiny_face_detector_model-shard1"]);
        assert_eq!(groups[0].weights[0].shape, vec![3, 3, 3, 16]);
        assert!(groups[0].weights[1].quantization.is_some());
    }

    #[test]
    fn rejects_empty_manifests() {
        assert!(parse_manifest(b"[]").is_err());
        assert!(parse_manifest(br#"[{"weights": [], "paths": []}]"#).is_err());
        assert!(parse_manifest(b"<html>").is_err());
    }

    fn artifact(kind: ModelKind) -> ModelArtifact {
        ModelArtifact {
            kind,
            groups: Vec::new(),
            shards: vec![vec![0; 8]],
        }
    }

    #[test]
    fn set_requires_every_kind_once() {
        let v = ModelVersion::new("v");
        let partial = ModelArtifacts::new(v.clone(), [artifact(ModelKind::FaceRecognition)]);
        assert!(matches!(
            partial,
            Err(VerificationError::ModelLoadFailed(_))
        ));

        let full = ModelArtifacts::new(v, ModelKind::ALL.map(artifact)).unwrap();
        assert_eq!(full.byte_len(), 32);
    }
}
