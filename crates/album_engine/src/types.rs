use std::fmt;
use std::time::Duration;

use album_core::{DownloadOutcome, ResourceUrl};
use bytes::Bytes;

/// Structured progress reported to a `ProgressSink` while the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    CheckpointLoaded {
        count: usize,
    },
    PageFetched {
        offset: u64,
        candidates: usize,
        fresh: usize,
        total: usize,
    },
    RetryScheduled {
        url: String,
        attempt: u32,
        delay: Duration,
        kind: FailureKind,
    },
    DiscoveryFinished {
        total: usize,
        fresh: usize,
        aborted: Option<String>,
    },
    DownloadFinished {
        index: usize,
        url: ResourceUrl,
        outcome: DownloadOutcome,
    },
    LedgerWritten {
        entries: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Bytes,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
    /// Requests issued before giving up; 0 when the request was never sent.
    pub attempts: u32,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts: 0,
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "shutdown requested")
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts > 1 {
            write!(
                f,
                "{} after {} attempts: {}",
                self.kind, self.attempts, self.message
            )
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
    Parse,
    Filesystem,
    Cancelled,
}

impl FailureKind {
    /// Retry predicate: connection trouble, timeouts and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            FailureKind::Network | FailureKind::Timeout => true,
            FailureKind::HttpStatus(code) => (500..600).contains(code),
            _ => false,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Parse => write!(f, "unexpected listing payload"),
            FailureKind::Filesystem => write!(f, "filesystem error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_timeout_and_server_errors_are_transient() {
        assert!(FailureKind::Network.is_transient());
        assert!(FailureKind::Timeout.is_transient());
        assert!(FailureKind::HttpStatus(500).is_transient());
        assert!(FailureKind::HttpStatus(503).is_transient());
        assert!(!FailureKind::HttpStatus(404).is_transient());
        assert!(!FailureKind::HttpStatus(429).is_transient());
        assert!(!FailureKind::Parse.is_transient());
        assert!(!FailureKind::Cancelled.is_transient());
    }

    #[test]
    fn display_mentions_attempts_when_retried() {
        let err = FetchError::new(FailureKind::HttpStatus(502), "Bad Gateway").with_attempts(3);
        assert_eq!(err.to_string(), "http status 502 after 3 attempts: Bad Gateway");
    }
}
