//! Graceful shutdown shared by discovery and downloads.
//!
//! Requesting shutdown stops new page requests and new download admissions and
//! cuts backoff and throttle sleeps short. A request already on the wire runs to
//! its end; a download stopped in backoff is recorded as failed.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    token: CancellationToken,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent; wakes every pending `sleep`.
    pub fn request(&self) {
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Sleeps for `duration`. Returns `false` if shutdown interrupted the sleep.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_requested() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
