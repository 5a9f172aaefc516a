use std::fmt;
use std::path::PathBuf;

/// Terminal result for one `ResourceUrl` of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success(PathBuf),
    /// A non-empty file with the assigned name already existed; nothing was fetched.
    Skipped(PathBuf),
    Failure(String),
    /// Never admitted because shutdown was requested first.
    Cancelled,
}

impl DownloadOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadOutcome::Failure(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    CompletedWithFailures(usize),
    AbortedDuringDiscovery,
    Interrupted { pending: usize },
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "Completed"),
            RunStatus::CompletedWithFailures(count) => write!(f, "CompletedWithFailures({count})"),
            RunStatus::AbortedDuringDiscovery => write!(f, "AbortedDuringDiscovery"),
            RunStatus::Interrupted { pending } => write!(f, "Interrupted({pending} pending)"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Size of the final URL set (checkpoint plus this run's discoveries).
    pub discovered: usize,
    pub newly_discovered: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub discovery_aborted: bool,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Success(_) => self.downloaded += 1,
            DownloadOutcome::Skipped(_) => self.skipped += 1,
            DownloadOutcome::Failure(_) => self.failed += 1,
            DownloadOutcome::Cancelled => self.cancelled += 1,
        }
    }

    pub fn status(&self) -> RunStatus {
        if self.interrupted {
            RunStatus::Interrupted {
                pending: self.cancelled,
            }
        } else if self.discovery_aborted {
            RunStatus::AbortedDuringDiscovery
        } else if self.failed > 0 {
            RunStatus::CompletedWithFailures(self.failed)
        } else {
            RunStatus::Completed
        }
    }
}
