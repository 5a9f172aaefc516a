use std::collections::HashSet;

use crate::ResourceUrl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub page_size: u64,
    /// Consecutive pages without new URLs that end discovery.
    pub stale_page_limit: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            page_size: 40,
            stale_page_limit: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryPhase {
    #[default]
    Idle,
    Requesting {
        offset: u64,
    },
    /// Waiting for the checkpoint append of the page at `offset` to become durable.
    Deduplicating {
        offset: u64,
    },
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEnd {
    Exhausted,
    Aborted { reason: String },
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryState {
    config: DiscoveryConfig,
    phase: DiscoveryPhase,
    known: HashSet<ResourceUrl>,
    urls: Vec<ResourceUrl>,
    preloaded: usize,
    stale_pages: u32,
    pages_loaded: u64,
    end: Option<DiscoveryEnd>,
}

impl DiscoveryState {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            phase: DiscoveryPhase::Idle,
            known: HashSet::new(),
            urls: Vec::new(),
            preloaded: 0,
            stale_pages: 0,
            pages_loaded: 0,
            end: None,
        }
    }

    pub fn config(&self) -> DiscoveryConfig {
        self.config
    }

    pub fn phase(&self) -> DiscoveryPhase {
        self.phase
    }

    /// Every known URL: checkpoint content first, then this run's discoveries in page order.
    pub fn urls(&self) -> &[ResourceUrl] {
        &self.urls
    }

    pub fn into_urls(self) -> Vec<ResourceUrl> {
        self.urls
    }

    pub fn contains(&self, url: &ResourceUrl) -> bool {
        self.known.contains(url)
    }

    pub fn preloaded_count(&self) -> usize {
        self.preloaded
    }

    pub fn discovered_count(&self) -> usize {
        self.urls.len() - self.preloaded
    }

    pub fn pages_loaded(&self) -> u64 {
        self.pages_loaded
    }

    pub fn end(&self) -> Option<&DiscoveryEnd> {
        self.end.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, DiscoveryPhase::Done | DiscoveryPhase::Aborted)
    }

    pub(crate) fn begin(&mut self, preloaded: Vec<ResourceUrl>) {
        for url in preloaded {
            if self.known.insert(url.clone()) {
                self.urls.push(url);
            }
        }
        self.preloaded = self.urls.len();
        self.phase = DiscoveryPhase::Requesting { offset: 0 };
    }

    /// Records the page and returns the URLs not seen before, in page order.
    pub(crate) fn absorb_page(&mut self, candidates: Vec<ResourceUrl>) -> Vec<ResourceUrl> {
        self.pages_loaded += 1;
        let mut fresh = Vec::new();
        for url in candidates {
            if self.known.insert(url.clone()) {
                self.urls.push(url.clone());
                fresh.push(url);
            }
        }
        if fresh.is_empty() {
            self.stale_pages += 1;
        } else {
            self.stale_pages = 0;
        }
        fresh
    }

    /// A resumed run keeps walking until the offset has passed its checkpointed prefix.
    pub(crate) fn stale_limit_reached(&self, offset: u64) -> bool {
        self.stale_pages >= self.config.stale_page_limit.max(1)
            && offset >= self.preloaded as u64
    }

    pub(crate) fn set_phase(&mut self, phase: DiscoveryPhase) {
        self.phase = phase;
    }

    pub(crate) fn finish(&mut self, end: DiscoveryEnd) {
        self.phase = match end {
            DiscoveryEnd::Exhausted => DiscoveryPhase::Done,
            DiscoveryEnd::Aborted { .. } | DiscoveryEnd::Interrupted => DiscoveryPhase::Aborted,
        };
        self.end = Some(end);
    }
}
