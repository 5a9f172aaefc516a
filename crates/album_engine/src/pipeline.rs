use std::path::{Path, PathBuf};
use std::sync::Arc;

use album_core::{AlbumRef, DiscoveryEnd, RunStatus, RunSummary};
use album_logging::{album_error, album_info, album_warn};
use thiserror::Error;

use crate::{
    ensure_output_dir, CheckpointError, CheckpointStore, ConfigError, DiscoveryReport,
    DownloadScheduler, EngineEvent, FetchError, Fetcher, ListingParser, Paginator, PersistError,
    PhotoListingParser, PipelineConfig, ProgressSink, ReqwestFetcher, SchedulerReport,
    ShutdownToken,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot create http client: {0}")]
    Client(#[from] FetchError),
    #[error("run directory unusable: {0}")]
    RunDir(#[from] PersistError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub summary: RunSummary,
    pub discovery: DiscoveryReport,
    pub downloads: SchedulerReport,
    pub ledger_path: Option<PathBuf>,
}

impl PipelineReport {
    pub fn status(&self) -> RunStatus {
        self.summary.status()
    }
}

/// Discovery followed by download for one album inside one run directory.
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn ListingParser>,
    sink: Arc<dyn ProgressSink>,
    shutdown: ShutdownToken,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn ProgressSink>,
        shutdown: ShutdownToken,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let parser = Arc::new(PhotoListingParser::new(config.strip_url_suffix.clone()));
        Ok(Self {
            config,
            fetcher,
            parser,
            sink,
            shutdown,
        })
    }

    /// Pipeline over the real network.
    pub fn with_reqwest(
        config: PipelineConfig,
        sink: Arc<dyn ProgressSink>,
        shutdown: ShutdownToken,
    ) -> Result<Self, PipelineError> {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch_settings())?);
        Self::new(config, fetcher, sink, shutdown)
    }

    pub async fn run(&self, album: &AlbumRef, run_dir: &Path) -> Result<PipelineReport, PipelineError> {
        ensure_output_dir(run_dir)?;
        let album_url = album.page_url(&self.config.site_base);
        album_info!("Album page: {}", album_url);
        album_info!("Run directory: {}", run_dir.display());

        let store = CheckpointStore::open(run_dir)?;
        let discovery = Paginator::new(
            self.fetcher.as_ref(),
            self.parser.as_ref(),
            self.sink.as_ref(),
            &self.shutdown,
            album_url.as_str(),
        )
        .with_policy(self.config.retry_policy())
        .with_discovery(self.config.discovery())
        .with_throttle(self.config.inter_page_delay_ms)
        .run(store)
        .await;

        if matches!(discovery.end, DiscoveryEnd::Aborted { .. }) && !discovery.urls.is_empty() {
            album_warn!(
                "Continuing with the {} URLs checkpointed so far.",
                discovery.urls.len()
            );
        }
        if discovery.urls.is_empty() {
            album_info!("No URLs discovered; nothing to download.");
        }

        let downloads = DownloadScheduler::new(
            self.fetcher.as_ref(),
            self.sink.as_ref(),
            &self.shutdown,
            run_dir.to_path_buf(),
            album_url.as_str(),
        )
        .with_policy(self.config.retry_policy())
        .with_concurrency_limit(self.config.concurrency_limit)
        .run(discovery.urls.iter())
        .await;

        let ledger_path = match downloads.ledger.persist(run_dir) {
            Ok(path) => path,
            Err(err) => {
                album_error!("Could not write failure ledger: {}", err);
                for (url, reason) in downloads.ledger.entries() {
                    album_error!("Unresolved {} ({})", url, reason);
                }
                None
            }
        };
        if ledger_path.is_some() {
            self.sink.emit(EngineEvent::LedgerWritten {
                entries: downloads.ledger.len(),
            });
        }

        let mut summary = RunSummary {
            discovered: discovery.urls.len(),
            newly_discovered: discovery.fresh,
            discovery_aborted: matches!(discovery.end, DiscoveryEnd::Aborted { .. }),
            interrupted: discovery.end == DiscoveryEnd::Interrupted,
            ..RunSummary::default()
        };
        for download in &downloads.downloads {
            summary.record(&download.outcome);
        }
        if summary.cancelled > 0 || self.shutdown.is_requested() {
            summary.interrupted = true;
        }

        Ok(PipelineReport {
            summary,
            discovery,
            downloads,
            ledger_path,
        })
    }
}
