use std::collections::VecDeque;

use album_core::{
    update, DiscoveryConfig, DiscoveryEffect, DiscoveryEnd, DiscoveryMsg, DiscoveryPhase,
    DiscoveryState, ResourceUrl,
};
use album_logging::{album_info, album_warn};

use crate::{
    decode_payload, fetch_with_retry, CheckpointStore, DelayRange, EngineEvent, FailureKind,
    FetchError, FetchRequest, Fetcher, ListingParser, ProgressSink, RetryPolicy, ShutdownToken,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Checkpoint content followed by this run's discoveries.
    pub urls: Vec<ResourceUrl>,
    pub preloaded: usize,
    pub fresh: usize,
    pub pages: u64,
    pub end: DiscoveryEnd,
}

/// Walks the album listing page by page, one request in flight, checkpointing every
/// page's new URLs before moving on.
pub struct Paginator<'a> {
    fetcher: &'a dyn Fetcher,
    parser: &'a dyn ListingParser,
    sink: &'a dyn ProgressSink,
    shutdown: &'a ShutdownToken,
    album_url: String,
    policy: RetryPolicy,
    discovery: DiscoveryConfig,
    throttle: DelayRange,
}

impl<'a> Paginator<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        parser: &'a dyn ListingParser,
        sink: &'a dyn ProgressSink,
        shutdown: &'a ShutdownToken,
        album_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            sink,
            shutdown,
            album_url: album_url.into(),
            policy: RetryPolicy::default(),
            discovery: DiscoveryConfig::default(),
            throttle: DelayRange::none(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_throttle(mut self, throttle: DelayRange) -> Self {
        self.throttle = throttle;
        self
    }

    /// Drives discovery to its end. Checkpoint appends run on the blocking pool;
    /// the store travels there and back with each batch.
    pub async fn run(&self, store: CheckpointStore) -> DiscoveryReport {
        let preloaded = store.load().to_vec();
        if !preloaded.is_empty() {
            album_info!("Loaded {} URLs from checkpoint.", preloaded.len());
        }
        self.sink.emit(EngineEvent::CheckpointLoaded {
            count: preloaded.len(),
        });

        let (mut state, effects) = update(
            DiscoveryState::new(self.discovery),
            DiscoveryMsg::Started { preloaded },
        );
        let mut store = Some(store);
        let mut queue: VecDeque<DiscoveryEffect> = effects.into();
        let mut end = None;

        while let Some(effect) = queue.pop_front() {
            let msg = match effect {
                DiscoveryEffect::RequestPage { offset } => self.request_page(offset).await,
                DiscoveryEffect::Checkpoint { urls } => checkpoint(&mut store, urls).await,
                DiscoveryEffect::Throttle => {
                    if self.shutdown.sleep(self.throttle.sample()).await {
                        continue;
                    }
                    DiscoveryMsg::Interrupted
                }
                DiscoveryEffect::Finished(done) => {
                    end = Some(done);
                    break;
                }
            };

            let page = match (&msg, state.phase()) {
                (DiscoveryMsg::PageLoaded { candidates }, DiscoveryPhase::Requesting { offset }) => {
                    Some((offset, candidates.len(), state.discovered_count()))
                }
                _ => None,
            };

            let (next, more) = update(state, msg);
            state = next;
            queue.extend(more);

            if let Some((offset, candidates, before)) = page {
                self.report_page(&state, offset, candidates, before);
            }
        }

        let end = end.unwrap_or_else(|| DiscoveryEnd::Aborted {
            reason: "discovery stopped without a result".into(),
        });
        self.finish(state, end)
    }

    async fn request_page(&self, offset: u64) -> DiscoveryMsg {
        if self.shutdown.is_requested() {
            return DiscoveryMsg::Interrupted;
        }
        match self.fetch_page(offset).await {
            Ok(candidates) => DiscoveryMsg::PageLoaded { candidates },
            Err(err) if err.kind == FailureKind::Cancelled => DiscoveryMsg::Interrupted,
            Err(err) => {
                album_warn!("Listing request at offset {} failed: {}", offset, err);
                DiscoveryMsg::PageFailed {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn fetch_page(&self, offset: u64) -> Result<Vec<ResourceUrl>, FetchError> {
        let request = FetchRequest::post_form(
            self.album_url.as_str(),
            self.album_url.as_str(),
            &[
                ("al", "1".to_string()),
                ("offset", offset.to_string()),
                ("part", "1".to_string()),
                ("rev", "1".to_string()),
            ],
        );
        let output =
            fetch_with_retry(self.fetcher, &request, &self.policy, self.sink, self.shutdown)
                .await?;
        let decoded = decode_payload(&output.bytes, output.metadata.content_type.as_deref())
            .map_err(|err| FetchError::new(FailureKind::Parse, err.to_string()))?;
        let page = self.parser.parse(&decoded.text)?;
        Ok(page.candidates)
    }

    fn report_page(&self, state: &DiscoveryState, offset: u64, candidates: usize, before: usize) {
        let fresh = state.discovered_count() - before;
        let total = state.urls().len();
        if candidates == 0 && offset == 0 && total == 0 {
            album_warn!("No URLs found on the first page; the album is empty or unavailable.");
        } else if candidates == 0 {
            album_info!("No more photos at offset {}.", offset);
        } else {
            album_info!(
                "Offset {}: {} new URLs (total unique {}).",
                offset,
                fresh,
                total
            );
        }
        self.sink.emit(EngineEvent::PageFetched {
            offset,
            candidates,
            fresh,
            total,
        });
    }

    fn finish(&self, state: DiscoveryState, end: DiscoveryEnd) -> DiscoveryReport {
        let preloaded = state.preloaded_count();
        let fresh = state.discovered_count();
        let pages = state.pages_loaded();
        let urls = state.into_urls();

        let aborted = match &end {
            DiscoveryEnd::Exhausted => {
                album_info!("Discovery finished: {} unique URLs ({} new).", urls.len(), fresh);
                None
            }
            DiscoveryEnd::Aborted { reason } => {
                album_warn!(
                    "Discovery aborted after {} pages: {}. Keeping {} checkpointed URLs.",
                    pages,
                    reason,
                    urls.len()
                );
                Some(reason.clone())
            }
            DiscoveryEnd::Interrupted => {
                album_warn!("Discovery interrupted; {} URLs checkpointed.", urls.len());
                Some("interrupted".to_string())
            }
        };
        self.sink.emit(EngineEvent::DiscoveryFinished {
            total: urls.len(),
            fresh,
            aborted,
        });

        DiscoveryReport {
            urls,
            preloaded,
            fresh,
            pages,
            end,
        }
    }
}

async fn checkpoint(slot: &mut Option<CheckpointStore>, urls: Vec<ResourceUrl>) -> DiscoveryMsg {
    let Some(mut store) = slot.take() else {
        return DiscoveryMsg::CheckpointFailed {
            reason: "checkpoint store lost after an earlier failure".into(),
        };
    };
    let joined = tokio::task::spawn_blocking(move || {
        let written = store.append(&urls);
        (store, written)
    })
    .await;
    match joined {
        Ok((store, Ok(_))) => {
            *slot = Some(store);
            DiscoveryMsg::CheckpointWritten
        }
        Ok((store, Err(err))) => {
            *slot = Some(store);
            DiscoveryMsg::CheckpointFailed {
                reason: err.to_string(),
            }
        }
        Err(err) => DiscoveryMsg::CheckpointFailed {
            reason: format!("checkpoint task failed: {err}"),
        },
    }
}
