//! Camera access with guaranteed release.
//!
//! The camera is a shared device resource: an attempt holds at most one
//! stream, through a [`CameraGuard`], and the guard stops the stream exactly
//! once, whether released explicitly or dropped because the attempt was
//! abandoned mid-capture.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("camera error: {0}")]
pub struct CameraError(pub String);

/// A device that can open a capture stream (user-facing camera).
#[async_trait]
pub trait Camera: Send + Sync {
    async fn open(&self) -> Result<Box<dyn CaptureStream>, CameraError>;
}

/// An open capture stream.
#[async_trait]
pub trait CaptureStream: Send {
    /// Grab an encoded still (JPEG/PNG). `Ok(None)` when no frame is available yet.
    async fn grab(&mut self) -> Result<Option<Vec<u8>>, CameraError>;

    /// Stop the stream and release the device.
    fn stop(&mut self);
}

/// Owns an open stream and stops it exactly once.
pub struct CameraGuard {
    stream: Option<Box<dyn CaptureStream>>,
}

impl CameraGuard {
    pub async fn acquire(camera: &dyn Camera) -> Result<Self, CameraError> {
        let stream = camera.open().await?;
        tracing::debug!("camera stream opened");
        Ok(Self {
            stream: Some(stream),
        })
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub async fn grab(&mut self) -> Result<Option<Vec<u8>>, CameraError> {
        match self.stream.as_mut() {
            Some(stream) => stream.grab().await,
            None => Err(CameraError("stream already released".into())),
        }
    }

    /// Stop the stream now. Later calls and the eventual drop are no-ops.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::debug!("camera stream stopped");
        }
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        self.release();
    }
}
