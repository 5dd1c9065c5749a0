//! Desktop side: wait for the phone to finish verification.

use std::sync::Arc;
use std::time::Duration;

use facepass_client::Backend;
use facepass_types::{Redirect, UserProfile};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Shortest period a poller accepts; shorter ones are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The profile reported `isVerified`.
    Verified(UserProfile),
    Cancelled,
}

impl PollOutcome {
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            PollOutcome::Verified(_) => Some(Redirect::home_after_verified()),
            PollOutcome::Cancelled => None,
        }
    }
}

/// Re-reads the current user on a fixed period until they are verified.
///
/// Requests never overlap: a slow response delays the next tick rather than
/// stacking another request behind it.
pub struct StatusPoller {
    backend: Arc<dyn Backend>,
    period: Duration,
}

impl StatusPoller {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_period(backend, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_period(backend: Arc<dyn Backend>, period: Duration) -> Self {
        let period = if period < MIN_POLL_INTERVAL {
            tracing::warn!(
                requested_ms = period.as_millis() as u64,
                min_ms = MIN_POLL_INTERVAL.as_millis() as u64,
                "poll interval too short, using minimum"
            );
            MIN_POLL_INTERVAL
        } else {
            period
        };
        Self { backend, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Poll until verified or until `shutdown` fires (or its sender is dropped).
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> PollOutcome {
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                result = self.backend.current_user() => result,
            };
            match result {
                Ok(user) if user.is_verified => {
                    tracing::info!(user_id = %user.id, "handover verification completed");
                    return PollOutcome::Verified(user);
                }
                Ok(_) => tracing::debug!("user not verified yet"),
                Err(e) => tracing::warn!(error = %e, "status poll failed, retrying"),
            }
        }

        tracing::info!("status polling cancelled");
        PollOutcome::Cancelled
    }

    /// Run on a background task. Dropping the handle stops polling.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> PollHandle {
        PollHandle {
            task: Some(tokio::spawn(async move { self.run(shutdown).await })),
        }
    }
}

/// Owns a spawned [`StatusPoller`]; aborts it on drop.
pub struct PollHandle {
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    /// Wait for the poller to finish.
    pub async fn outcome(mut self) -> PollOutcome {
        let Some(task) = self.task.take() else {
            return PollOutcome::Cancelled;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_panic() {
                    tracing::error!(error = %e, "status poller panicked");
                }
                PollOutcome::Cancelled
            }
        }
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
