use std::sync::atomic::{AtomicUsize, Ordering};

use album_core::DownloadOutcome;
use album_engine::{EngineEvent, ProgressSink};
use album_logging::{album_debug, album_info};

/// Turns engine events into a running `[done/total]` counter in the log.
#[derive(Debug, Default)]
pub struct LogSink {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}

impl ProgressSink for LogSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::DiscoveryFinished { total, .. } => {
                self.total.store(total, Ordering::Relaxed);
            }
            EngineEvent::DownloadFinished { index, outcome, .. } => {
                let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
                let total = self.total.load(Ordering::Relaxed);
                let label = match outcome {
                    DownloadOutcome::Success(_) => "saved",
                    DownloadOutcome::Skipped(_) => "present",
                    DownloadOutcome::Failure(_) => "failed",
                    DownloadOutcome::Cancelled => "cancelled",
                };
                album_debug!("[{}/{}] #{} {}", done, total, index, label);
                if total > 0 && done % 50 == 0 && done < total {
                    album_info!("Progress: {}/{} files handled.", done, total);
                }
            }
            EngineEvent::LedgerWritten { entries } => {
                album_info!("{} unresolved URLs recorded for a later run.", entries);
            }
            other => album_debug!("{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use album_core::ResourceUrl;
    use std::path::PathBuf;

    #[test]
    fn counts_finished_downloads() {
        let sink = LogSink::new();
        sink.emit(EngineEvent::DiscoveryFinished {
            total: 2,
            fresh: 2,
            aborted: None,
        });
        for index in 1..=2 {
            sink.emit(EngineEvent::DownloadFinished {
                index,
                url: ResourceUrl::new(format!("https://img.example/{index}.jpg")).unwrap(),
                outcome: DownloadOutcome::Success(PathBuf::from(format!("{index:04}.jpg"))),
            });
        }
        assert_eq!(sink.done(), 2);
    }
}
