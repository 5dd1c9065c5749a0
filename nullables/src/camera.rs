//! Nullable camera: scripted frames and open/stop counting.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use facepass_verification::{Camera, CameraError, CaptureStream};

#[derive(Default)]
struct Shared {
    frames: Mutex<VecDeque<Option<Vec<u8>>>>,
    repeat_last: Mutex<Option<Vec<u8>>>,
    hang: AtomicBool,
    fail_open: AtomicBool,
    opens: AtomicUsize,
    stops: AtomicUsize,
    grabs: AtomicUsize,
}

/// A test camera whose streams return queued frames.
///
/// When the queue is empty, the last frame set with [`NullCamera::always`]
/// is returned; with nothing set, `grab` yields `None` (no frame yet).
#[derive(Clone, Default)]
pub struct NullCamera {
    shared: Arc<Shared>,
}

impl NullCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one encoded frame.
    pub fn push_frame(&self, bytes: Vec<u8>) {
        self.shared.frames.lock().unwrap().push_back(Some(bytes));
    }

    /// Queue a grab that produces no frame.
    pub fn push_empty(&self) {
        self.shared.frames.lock().unwrap().push_back(None);
    }

    /// Serve this frame whenever the queue is empty.
    pub fn always(&self, bytes: Vec<u8>) {
        *self.shared.repeat_last.lock().unwrap() = Some(bytes);
    }

    /// Make every grab wait forever, to simulate leaving mid-capture.
    pub fn hang_on_grab(&self) {
        self.shared.hang.store(true, Ordering::SeqCst);
    }

    pub fn fail_open(&self) {
        self.shared.fail_open.store(true, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }

    pub fn grabs(&self) -> usize {
        self.shared.grabs.load(Ordering::SeqCst)
    }

    /// Streams opened and not yet stopped.
    pub fn active_streams(&self) -> usize {
        self.opens() - self.stops()
    }
}

#[async_trait]
impl Camera for NullCamera {
    async fn open(&self) -> Result<Box<dyn CaptureStream>, CameraError> {
        if self.shared.fail_open.load(Ordering::SeqCst) {
            return Err(CameraError("Permission denied".into()));
        }
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(NullStream {
            shared: self.shared.clone(),
        }))
    }
}

struct NullStream {
    shared: Arc<Shared>,
}

#[async_trait]
impl CaptureStream for NullStream {
    async fn grab(&mut self) -> Result<Option<Vec<u8>>, CameraError> {
        self.shared.grabs.fetch_add(1, Ordering::SeqCst);
        if self.shared.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if let Some(frame) = self.shared.frames.lock().unwrap().pop_front() {
            return Ok(frame);
        }
        Ok(self.shared.repeat_last.lock().unwrap().clone())
    }

    fn stop(&mut self) {
        // Every call counts, so a double stop shows up in assertions.
        self.shared.stops.fetch_add(1, Ordering::SeqCst);
    }
}
