#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use album_core::ResourceUrl;
use album_engine::{
    EngineEvent, FetchError, FetchMetadata, FetchOutput, FetchRequest, Fetcher, ProgressSink,
};
use bytes::Bytes;

type Responder = dyn Fn(&FetchRequest, u32) -> Result<FetchOutput, FetchError> + Send + Sync;

/// Fake fetcher answering from a closure that receives the request and the 1-based
/// call number for that URL. Counts calls and the peak number of requests in flight.
pub struct ScriptedFetcher {
    respond: Box<Responder>,
    delay: Duration,
    calls: Mutex<HashMap<String, u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&FetchRequest, u32) -> Result<FetchOutput, FetchError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutput, FetchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let entry = calls.entry(request.url.clone()).or_insert(0);
            *entry += 1;
            *entry
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = (self.respond)(request, call);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn ok_bytes(url: &str, body: &[u8]) -> Result<FetchOutput, FetchError> {
    Ok(FetchOutput {
        bytes: Bytes::copy_from_slice(body),
        metadata: FetchMetadata {
            original_url: url.to_string(),
            final_url: url.to_string(),
            content_type: Some("image/jpeg".to_string()),
            byte_len: body.len() as u64,
        },
    })
}

#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn url(raw: &str) -> ResourceUrl {
    ResourceUrl::new(raw).unwrap()
}

pub fn urls(prefix: &str, count: usize) -> Vec<ResourceUrl> {
    (0..count)
        .map(|i| url(&format!("{prefix}/p{i:02}.jpg")))
        .collect()
}
