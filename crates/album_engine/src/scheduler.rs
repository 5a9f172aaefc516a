use std::path::PathBuf;

use album_core::{DownloadOutcome, ResourceUrl};
use album_logging::{album_debug, album_info, album_warn};
use bytes::Bytes;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::persist::is_non_empty_file;
use crate::{
    assign_filenames, fetch_with_retry, AtomicFileWriter, EngineEvent, FailureKind, FailureLedger,
    FetchRequest, Fetcher, NamedResource, ProgressSink, RetryPolicy, ShutdownToken,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledDownload {
    pub index: usize,
    pub url: ResourceUrl,
    pub path: PathBuf,
    pub outcome: DownloadOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// One entry per URL, ordered by index.
    pub downloads: Vec<ScheduledDownload>,
    pub ledger: FailureLedger,
}

impl SchedulerReport {
    pub fn outcome_of(&self, url: &ResourceUrl) -> Option<&DownloadOutcome> {
        self.downloads
            .iter()
            .find(|download| &download.url == url)
            .map(|download| &download.outcome)
    }
}

/// Downloads a URL set into the run directory with at most `concurrency_limit`
/// fetches in flight. Tasks are polled cooperatively on the calling task; a counting
/// semaphore admits them and each permit is released when its task ends, however
/// it ends.
///
/// Shutdown only closes the gate. A download that was already sent and is cut
/// short in its retry backoff ends as a `Failure` and lands in the ledger.
pub struct DownloadScheduler<'a> {
    fetcher: &'a dyn Fetcher,
    sink: &'a dyn ProgressSink,
    shutdown: &'a ShutdownToken,
    writer: AtomicFileWriter,
    referer: String,
    policy: RetryPolicy,
    concurrency_limit: usize,
}

impl<'a> DownloadScheduler<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        sink: &'a dyn ProgressSink,
        shutdown: &'a ShutdownToken,
        run_dir: PathBuf,
        referer: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            sink,
            shutdown,
            writer: AtomicFileWriter::new(run_dir),
            referer: referer.into(),
            policy: RetryPolicy::default(),
            concurrency_limit: 8,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency_limit(mut self, concurrency_limit: usize) -> Self {
        self.concurrency_limit = concurrency_limit.max(1);
        self
    }

    pub async fn run<'u, I>(&self, urls: I) -> SchedulerReport
    where
        I: IntoIterator<Item = &'u ResourceUrl>,
    {
        let named = assign_filenames(urls);
        album_info!(
            "Downloading {} files with up to {} in flight.",
            named.len(),
            self.concurrency_limit
        );

        let gate = Semaphore::new(self.concurrency_limit);
        let mut tasks: FuturesUnordered<_> = named
            .into_iter()
            .map(|resource| self.download_one(resource, &gate))
            .collect();

        let mut report = SchedulerReport::default();
        while let Some(done) = tasks.next().await {
            if let DownloadOutcome::Failure(reason) = &done.outcome {
                report.ledger.record(done.url.clone(), reason.clone());
            }
            self.sink.emit(EngineEvent::DownloadFinished {
                index: done.index,
                url: done.url.clone(),
                outcome: done.outcome.clone(),
            });
            report.downloads.push(done);
        }
        report.downloads.sort_by_key(|download| download.index);
        report
    }

    async fn download_one(&self, resource: NamedResource, gate: &Semaphore) -> ScheduledDownload {
        let path = self.writer.dir().join(&resource.filename);
        let outcome = self.resolve(&resource, &path, gate).await;
        ScheduledDownload {
            index: resource.index,
            url: resource.url,
            path,
            outcome,
        }
    }

    async fn resolve(
        &self,
        resource: &NamedResource,
        path: &std::path::Path,
        gate: &Semaphore,
    ) -> DownloadOutcome {
        if is_non_empty_file(path).await {
            album_debug!("Skip existing {}", resource.filename);
            return DownloadOutcome::Skipped(path.to_path_buf());
        }

        let Ok(_permit) = gate.acquire().await else {
            return DownloadOutcome::Cancelled;
        };
        if self.shutdown.is_requested() {
            return DownloadOutcome::Cancelled;
        }

        let request = FetchRequest::get(resource.url.as_str(), self.referer.as_str());
        let output =
            match fetch_with_retry(self.fetcher, &request, &self.policy, self.sink, self.shutdown)
                .await
            {
                Ok(output) => output,
                // Shutdown landed between admission and the first request.
                Err(err) if err.kind == FailureKind::Cancelled && err.attempts == 0 => {
                    return DownloadOutcome::Cancelled;
                }
                Err(err) => {
                    album_warn!("Failed {} ({})", resource.filename, err);
                    return DownloadOutcome::Failure(err.to_string());
                }
            };

        if output.bytes.is_empty() {
            album_warn!("Failed {} (empty response body)", resource.filename);
            return DownloadOutcome::Failure("empty response body".to_string());
        }

        match self.persist(&resource.filename, output.bytes).await {
            Ok(saved) => {
                album_info!("Saved {}", resource.filename);
                DownloadOutcome::Success(saved)
            }
            Err(reason) => {
                album_warn!("Failed {} ({})", resource.filename, reason);
                DownloadOutcome::Failure(reason)
            }
        }
    }

    async fn persist(&self, filename: &str, bytes: Bytes) -> Result<PathBuf, String> {
        let writer = self.writer.clone();
        let filename = filename.to_string();
        tokio::task::spawn_blocking(move || writer.write(&filename, &bytes))
            .await
            .map_err(|err| format!("{}: {err}", FailureKind::Filesystem))?
            .map_err(|err| format!("{}: {err}", FailureKind::Filesystem))
    }
}
