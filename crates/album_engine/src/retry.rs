use std::time::Duration;

use album_logging::{album_debug, album_warn};
use rand::Rng;

use crate::{
    EngineEvent, FailureKind, FetchError, FetchOutput, FetchRequest, Fetcher, ProgressSink,
    ShutdownToken,
};

/// Bounded retry with capped, jittered exponential backoff. Shared by listing
/// requests and image downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the wait after failed attempt `attempt` (1-based):
    /// `base * 2^(attempt-1)`, capped at `max_delay`.
    pub fn backoff_cap(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Jittered wait, uniform in `[cap / 2, cap]`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let cap = self.backoff_cap(attempt);
        let half = cap / 2;
        let spread = (cap - half).as_millis() as u64;
        if spread == 0 {
            return cap;
        }
        half + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }
}

/// Issues `request` until it succeeds, fails permanently, or `max_attempts` requests
/// have been made. The returned error carries the last underlying cause.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    request: &FetchRequest,
    policy: &RetryPolicy,
    sink: &dyn ProgressSink,
    shutdown: &ShutdownToken,
) -> Result<FetchOutput, FetchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        if shutdown.is_requested() {
            return Err(FetchError::cancelled().with_attempts(attempt));
        }
        attempt += 1;
        album_debug!("{:?} {} (try {}/{})", request.method, request.url, attempt, max_attempts);

        let err = match fetcher.fetch(request).await {
            Ok(output) => return Ok(output),
            Err(err) => err.with_attempts(attempt),
        };

        if !err.is_transient() || attempt >= max_attempts {
            return Err(err);
        }

        let delay = policy.backoff_delay(attempt);
        album_warn!(
            "{} failed on attempt {}/{} ({}); retrying in {:?}",
            request.url,
            attempt,
            max_attempts,
            err.kind,
            delay
        );
        sink.emit(EngineEvent::RetryScheduled {
            url: request.url.clone(),
            attempt,
            delay,
            kind: err.kind.clone(),
        });

        if !shutdown.sleep(delay).await {
            return Err(FetchError::new(
                FailureKind::Cancelled,
                format!("shutdown during backoff, last error: {err}"),
            )
            .with_attempts(attempt));
        }
    }
}
