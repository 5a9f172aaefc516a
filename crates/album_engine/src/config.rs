use std::time::Duration;

use album_core::DiscoveryConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::RetryPolicy;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("inter-page delay range is inverted ({min_ms} ms > {max_ms} ms)")]
    InvertedDelay { min_ms: u64, max_ms: u64 },
    #[error("base delay ({base_ms} ms) exceeds max delay ({max_ms} ms)")]
    InvertedBackoff { base_ms: u64, max_ms: u64 },
}

/// Per-request transport settings of `ReqwestFetcher`.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 64 * 1024 * 1024,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub fn none() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
        }
    }

    pub fn sample(&self) -> Duration {
        use rand::Rng;
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSection {
    fn default() -> Self {
        let defaults = FetchSettings::default();
        Self {
            connect_timeout_ms: defaults.connect_timeout.as_millis() as u64,
            request_timeout_ms: defaults.request_timeout.as_millis() as u64,
            redirect_limit: defaults.redirect_limit,
            max_bytes: defaults.max_bytes,
            user_agent: defaults.user_agent,
        }
    }
}

/// Options recognised by the pipeline. Loaded from a RON file by the binary; every
/// field falls back to its default when absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub page_size: u64,
    pub concurrency_limit: usize,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub inter_page_delay_ms: DelayRange,
    pub stale_page_limit: u32,
    pub site_base: String,
    /// Thumbnail parameters appended to image URLs in listing markup.
    pub strip_url_suffix: String,
    pub fetch: FetchSection,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_size: 40,
            concurrency_limit: 8,
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 20_000,
            inter_page_delay_ms: DelayRange {
                min_ms: 0,
                max_ms: 1_000,
            },
            stale_page_limit: 1,
            site_base: "https://vk.com".to_string(),
            strip_url_suffix: "&from=bu&cs=240x0".to_string(),
            fetch: FetchSection::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Zero("page_size"));
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Zero("concurrency_limit"));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Zero("max_attempts"));
        }
        if self.inter_page_delay_ms.min_ms > self.inter_page_delay_ms.max_ms {
            return Err(ConfigError::InvertedDelay {
                min_ms: self.inter_page_delay_ms.min_ms,
                max_ms: self.inter_page_delay_ms.max_ms,
            });
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigError::InvertedBackoff {
                base_ms: self.base_delay_ms,
                max_ms: self.max_delay_ms,
            });
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            page_size: self.page_size,
            stale_page_limit: self.stale_page_limit,
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_millis(self.fetch.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.fetch.request_timeout_ms),
            redirect_limit: self.fetch.redirect_limit,
            max_bytes: self.fetch.max_bytes,
            user_agent: self.fetch.user_agent.clone(),
        }
    }
}
